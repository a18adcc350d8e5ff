//! Database configuration.

use crate::error::{CoreError, CoreResult};
use crate::id::IdGenerator;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tabledb_storage::Indent;

/// Callback invoked when a background cache flush fails.
///
/// The error is always [`CoreError::Flush`].
pub type FlushErrorHook = Arc<dyn Fn(&CoreError) + Send + Sync>;

/// Configuration for opening a database.
#[derive(Clone)]
pub struct Config {
    /// Path to the JSON document file.
    pub path: PathBuf,

    /// Flush interval of the write-back cache. `None` disables caching.
    pub cache_interval: Option<Duration>,

    /// Indentation width for the file on disk. `None` or `0` = compact.
    pub json_spaces: Option<usize>,

    /// Whether a missing file is treated as an empty document.
    pub create_if_missing: bool,

    /// Receives errors from background flushes.
    pub on_flush_error: Option<FlushErrorHook>,

    /// Identifier source for inserted records. `None` = UUIDv7.
    pub id_generator: Option<Arc<dyn IdGenerator>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("db.json"),
            cache_interval: None, // disabled
            json_spaces: None,    // compact
            create_if_missing: true,
            on_flush_error: None,
            id_generator: None,
        }
    }
}

impl Config {
    /// Creates a new configuration for the given document path.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Enables the write-back cache with the given flush interval.
    #[must_use]
    pub fn cache_interval(mut self, interval: Duration) -> Self {
        self.cache_interval = Some(interval);
        self
    }

    /// Enables the write-back cache, interval given in milliseconds.
    #[must_use]
    pub fn cache_interval_ms(self, millis: u64) -> Self {
        self.cache_interval(Duration::from_millis(millis))
    }

    /// Sets the indentation width used on disk.
    #[must_use]
    pub fn json_spaces(mut self, spaces: usize) -> Self {
        self.json_spaces = Some(spaces);
        self
    }

    /// Sets whether a missing file is treated as an empty document.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the callback for background flush failures.
    #[must_use]
    pub fn on_flush_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CoreError) + Send + Sync + 'static,
    {
        self.on_flush_error = Some(Arc::new(hook));
        self
    }

    /// Sets the identifier generator.
    #[must_use]
    pub fn id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Returns `true` if the write-back cache is enabled.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.cache_interval.is_some()
    }

    /// Returns the on-disk indentation.
    #[must_use]
    pub fn indent(&self) -> Indent {
        Indent::from_spaces(self.json_spaces)
    }

    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the path is empty or the cache interval
    /// is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CoreError::invalid_config("path must not be empty"));
        }
        if self.cache_interval == Some(Duration::ZERO) {
            return Err(CoreError::invalid_config(
                "cache interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("cache_interval", &self.cache_interval)
            .field("json_spaces", &self.json_spaces)
            .field("create_if_missing", &self.create_if_missing)
            .field("on_flush_error", &self.on_flush_error.is_some())
            .field("id_generator", &self.id_generator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.is_caching());
        assert!(config.create_if_missing);
        assert_eq!(config.indent(), Indent::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new("data/app.json")
            .cache_interval_ms(250)
            .json_spaces(2)
            .create_if_missing(false);

        assert_eq!(config.path, PathBuf::from("data/app.json"));
        assert_eq!(config.cache_interval, Some(Duration::from_millis(250)));
        assert!(config.is_caching());
        assert_eq!(config.indent(), Indent::Spaces(2));
        assert!(!config.create_if_missing);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = Config::new("db.json").cache_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(Config::new("").validate().is_err());
    }

    #[test]
    fn debug_hides_callbacks() {
        let config = Config::new("db.json").on_flush_error(|_| {});
        let text = format!("{config:?}");
        assert!(text.contains("on_flush_error: true"));
    }
}
