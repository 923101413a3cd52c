//! Tenant Resolution
//!
//! Strategies for determining the active wiki's dbname from a request.
//! They are tried in a fixed order: explicit override, custom domain map,
//! then hostname-suffix match against the configured site families.

use crate::cache::DatabaseIndex;
use crate::error::{Result, TenancyError};
use std::fmt;
use tracing::{debug, info};
use wikifarm_config::SuffixRule;

/// Identity of the incoming request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub host: Option<String>,
    pub explicit: Option<String>,
}

impl RequestIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_explicit(mut self, dbname: impl Into<String>) -> Self {
        self.explicit = Some(dbname.into());
        self
    }

    pub fn from_host(host: impl Into<String>) -> Self {
        Self::new().with_host(host)
    }

    /// Build from raw header pairs, matching `Host` case-insensitively
    ///
    /// # Examples
    ///
    /// ```
    /// use wikifarm_tenancy::RequestIdentity;
    ///
    /// let identity = RequestIdentity::from_headers([("HOST", "wiki.example.org")]);
    /// assert_eq!(identity.host.as_deref(), Some("wiki.example.org"));
    /// ```
    pub fn from_headers<K, V>(headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let host = headers
            .into_iter()
            .find(|(name, _)| name.as_ref().eq_ignore_ascii_case("host"))
            .map(|(_, value)| value.as_ref().trim().to_string())
            .filter(|host| !host.is_empty());

        Self {
            host,
            explicit: None,
        }
    }

    /// Set the explicit override from environment variable `var`, if set
    pub fn with_env_override(mut self, var: &str) -> Self {
        if let Some(dbname) = std::env::var(var).ok().filter(|v| !v.is_empty()) {
            self.explicit = Some(dbname);
        }
        self
    }
}

/// Which strategy produced the dbname
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Explicit,
    DomainMap,
    SuffixMatch,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Explicit => write!(f, "explicit"),
            Strategy::DomainMap => write!(f, "domain-map"),
            Strategy::SuffixMatch => write!(f, "suffix-match"),
        }
    }
}

/// One way of turning a request into a dbname
pub trait ResolutionStrategy: Send + Sync {
    fn kind(&self) -> Strategy;

    /// `None` when this strategy does not apply to the request
    fn resolve(&self, identity: &RequestIdentity, index: &DatabaseIndex) -> Option<String>;
}

/// Explicit override, used verbatim without checking the index
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitOverride;

impl ResolutionStrategy for ExplicitOverride {
    fn kind(&self) -> Strategy {
        Strategy::Explicit
    }

    fn resolve(&self, identity: &RequestIdentity, _index: &DatabaseIndex) -> Option<String> {
        identity.explicit.clone()
    }
}

/// Custom domains registered in the index
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainMap;

impl ResolutionStrategy for DomainMap {
    fn kind(&self) -> Strategy {
        Strategy::DomainMap
    }

    fn resolve(&self, identity: &RequestIdentity, index: &DatabaseIndex) -> Option<String> {
        let host = identity.host.as_deref()?;
        index.domain_for_host(host).map(str::to_string)
    }
}

/// Subdomain of a known site family
///
/// `alpha.example.net` with rule `example.net → wiki` resolves to
/// `alphawiki`. Rules are tried in configured order.
#[derive(Debug, Clone, Default)]
pub struct SuffixMatch {
    rules: Vec<SuffixRule>,
}

impl SuffixMatch {
    pub fn new(rules: Vec<SuffixRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[SuffixRule] {
        &self.rules
    }

    /// Match a bare hostname against the rules
    pub fn match_host(&self, host: &str) -> Option<String> {
        let (label, rest) = host.split_once('.')?;
        if label.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.family == rest)
            .map(|rule| format!("{}{}", label, rule.suffix))
    }

    /// Canonical server URL for `dbname`, from the first rule whose
    /// suffix it carries
    pub fn server_url(&self, dbname: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let label = dbname.strip_suffix(rule.suffix.as_str())?;
            if label.is_empty() {
                return None;
            }
            Some(format!("https://{}.{}", label, rule.family))
        })
    }
}

impl ResolutionStrategy for SuffixMatch {
    fn kind(&self) -> Strategy {
        Strategy::SuffixMatch
    }

    fn resolve(&self, identity: &RequestIdentity, _index: &DatabaseIndex) -> Option<String> {
        self.match_host(identity.host.as_deref()?)
    }
}

/// A resolved dbname and how it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub dbname: String,
    pub strategy: Strategy,
}

/// Ordered chain of resolution strategies
pub struct TenantResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl TenantResolver {
    /// Standard chain: explicit override, domain map, suffix match
    pub fn new(rules: Vec<SuffixRule>) -> Self {
        Self::with_strategies(vec![
            Box::new(ExplicitOverride),
            Box::new(DomainMap),
            Box::new(SuffixMatch::new(rules)),
        ])
    }

    /// Custom chain, tried in the given order
    pub fn with_strategies(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolve the request; failing every strategy is fatal
    pub fn resolve(&self, identity: &RequestIdentity, index: &DatabaseIndex) -> Result<Resolution> {
        for strategy in &self.strategies {
            if let Some(dbname) = strategy.resolve(identity, index) {
                info!(
                    dbname = %dbname,
                    strategy = %strategy.kind(),
                    host = identity.host.as_deref().unwrap_or("-"),
                    "Resolved wiki"
                );
                return Ok(Resolution {
                    dbname,
                    strategy: strategy.kind(),
                });
            }
            debug!(strategy = %strategy.kind(), "Strategy did not match");
        }

        Err(TenancyError::Unresolvable {
            host: identity.host.clone(),
        })
    }
}

impl fmt::Debug for TenantResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantResolver")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Resolve a dbname from an optional host and explicit override
///
/// # Examples
///
/// ```
/// use wikifarm_config::SuffixRule;
/// use wikifarm_tenancy::{resolve, DatabaseIndex};
///
/// let index = DatabaseIndex::new(["alphawiki"]);
/// let rules = [SuffixRule::new("example.net", "wiki")];
///
/// let dbname = resolve(Some("alpha.example.net"), None, &index, &rules).unwrap();
/// assert_eq!(dbname, "alphawiki");
/// ```
pub fn resolve(
    host: Option<&str>,
    explicit: Option<&str>,
    index: &DatabaseIndex,
    rules: &[SuffixRule],
) -> Result<String> {
    let identity = RequestIdentity {
        host: host.map(str::to_string),
        explicit: explicit.map(str::to_string),
    };

    TenantResolver::new(rules.to_vec())
        .resolve(&identity, index)
        .map(|resolution| resolution.dbname)
}
