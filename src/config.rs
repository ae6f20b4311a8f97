//! Repository configuration and per-call overrides.

use std::{env, str, time};

/// Serialized size, in bytes, after which a list stops paging and reports a partial result.
pub const DEFAULT_LIST_SIZE_CEILING: usize = 5120;

/// Instance-level repository settings.
///
/// ```rust
/// use dynamodb_envelope::config::RepositoryConfig;
/// use std::time::Duration;
///
/// let config = RepositoryConfig {
///     use_soft_delete: true,
///     soft_delete_ttl: Some(Duration::from_secs(7 * 24 * 3600)),
///     ..RepositoryConfig::new("orders")
/// };
/// assert!(config.use_is_deleted);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RepositoryConfig {
    /// Maximum number of records held by the read cache. Zero disables it.
    pub cache_capacity: usize,
    /// How long a cached record may be served.
    pub cache_freshness: time::Duration,
    /// Whether reads by key use strongly consistent reads.
    pub consistent_read: bool,
    /// Items requested per page while listing; `None` lets the remaining limit decide.
    pub list_page_size: Option<usize>,
    /// See [`DEFAULT_LIST_SIZE_CEILING`].
    pub list_size_ceiling: usize,
    /// Expiry set on soft-deleted records.
    pub soft_delete_ttl: Option<time::Duration>,
    /// Default table.
    pub table_name: String,
    /// Default deadline of each store call.
    pub timeout: Option<time::Duration>,
    /// Whether operations use the read cache unless the caller says otherwise.
    pub use_cache: bool,
    /// Whether lists exclude records marked `IsDeleted`.
    pub use_is_deleted: bool,
    /// Whether deletes mark records `IsDeleted` instead of removing them.
    pub use_soft_delete: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1000,
            cache_freshness: time::Duration::from_secs(60),
            consistent_read: false,
            list_page_size: None,
            list_size_ceiling: DEFAULT_LIST_SIZE_CEILING,
            soft_delete_ttl: None,
            table_name: String::new(),
            timeout: None,
            use_cache: true,
            use_is_deleted: true,
            use_soft_delete: false,
        }
    }
}

impl RepositoryConfig {
    /// Default settings over the given table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Settings read from `DYNAMODB_*` environment variables, falling back to defaults.
    ///
    /// Recognized variables: `DYNAMODB_TABLE_NAME`, `DYNAMODB_USE_CACHE`,
    /// `DYNAMODB_CACHE_CAPACITY`, `DYNAMODB_CACHE_FRESHNESS_SECS`,
    /// `DYNAMODB_CONSISTENT_READ`, `DYNAMODB_LIST_PAGE_SIZE`, `DYNAMODB_TIMEOUT_MS`,
    /// `DYNAMODB_USE_SOFT_DELETE`, `DYNAMODB_USE_IS_DELETED` and
    /// `DYNAMODB_SOFT_DELETE_TTL_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Settings read through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            cache_capacity: parse(&lookup, "DYNAMODB_CACHE_CAPACITY")
                .unwrap_or(defaults.cache_capacity),
            cache_freshness: parse(&lookup, "DYNAMODB_CACHE_FRESHNESS_SECS")
                .map(time::Duration::from_secs)
                .unwrap_or(defaults.cache_freshness),
            consistent_read: parse(&lookup, "DYNAMODB_CONSISTENT_READ")
                .unwrap_or(defaults.consistent_read),
            list_page_size: parse(&lookup, "DYNAMODB_LIST_PAGE_SIZE").or(defaults.list_page_size),
            list_size_ceiling: defaults.list_size_ceiling,
            soft_delete_ttl: parse(&lookup, "DYNAMODB_SOFT_DELETE_TTL_SECS")
                .map(time::Duration::from_secs)
                .or(defaults.soft_delete_ttl),
            table_name: lookup("DYNAMODB_TABLE_NAME").unwrap_or(defaults.table_name),
            timeout: parse(&lookup, "DYNAMODB_TIMEOUT_MS")
                .map(time::Duration::from_millis)
                .or(defaults.timeout),
            use_cache: parse(&lookup, "DYNAMODB_USE_CACHE").unwrap_or(defaults.use_cache),
            use_is_deleted: parse(&lookup, "DYNAMODB_USE_IS_DELETED")
                .unwrap_or(defaults.use_is_deleted),
            use_soft_delete: parse(&lookup, "DYNAMODB_USE_SOFT_DELETE")
                .unwrap_or(defaults.use_soft_delete),
        }
    }
}

fn parse<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: str::FromStr,
{
    let value = lookup(name)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(name, %value, "ignoring malformed configuration value");
            None
        }
    }
}

/// Per-call overrides of the instance configuration.
///
/// ```rust
/// use dynamodb_envelope::config::CallerInfo;
/// use std::time::Duration;
///
/// let caller = CallerInfo::default()
///     .with_table("tenant-7-orders")
///     .with_timeout(Duration::from_millis(250));
/// assert_eq!(caller.table.as_deref(), Some("tenant-7-orders"));
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallerInfo {
    /// Table to use instead of the configured one.
    pub table: Option<String>,
    /// Deadline of each store call made by the operation.
    pub timeout: Option<time::Duration>,
    /// Whether to use the read cache.
    pub use_cache: Option<bool>,
}

impl CallerInfo {
    /// Route the call to another table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Bound each store call.
    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Force the read cache on or off.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = Some(use_cache);
        self
    }
}
