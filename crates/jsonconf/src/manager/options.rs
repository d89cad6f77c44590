//! Construction parameters for a [`ConfigManager`](super::ConfigManager).
//!
//! [`ManagerOptions`] is a plain struct so a host application can embed it in
//! its own configuration; [`ConfigManagerBuilder`] sets the same values
//! fluently and carries the two non-serializable inputs (the target and its
//! schema).

use std::path::PathBuf;
use std::time::Duration;

use jsonconf_core::{ArgumentError, ConfigError, ConfigSchema, ConfigTarget, Escaping};
use serde::{Deserialize, Serialize};

use super::{ConfigManager, SharedConfig};
use crate::storage::{base_dir, resolve_path, DEFAULT_FILE_NAME};

/// Everything about a manager except the target and its schema.
///
/// | Field                   | Default        |
/// |-------------------------|----------------|
/// | `path`                  | `config.json`  |
/// | `auto_save_interval_ms` | `0` (disabled) |
/// | `escaping`              | `relaxed`      |
/// | `create_dirs`           | `false`        |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerOptions {
    /// Backing file.  Relative paths are resolved against the directory of
    /// the running executable.
    pub path: PathBuf,
    /// Auto-save period in milliseconds.  `0` disables auto-save.
    pub auto_save_interval_ms: u64,
    /// String escaping used when writing the file.
    pub escaping: Escaping,
    /// Create missing parent directories of `path` before opening it.
    pub create_dirs: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE_NAME),
            auto_save_interval_ms: 0,
            escaping: Escaping::default(),
            create_dirs: false,
        }
    }
}

impl ManagerOptions {
    /// The auto-save period, or `None` when auto-save is disabled.
    pub fn auto_save_interval(&self) -> Option<Duration> {
        (self.auto_save_interval_ms > 0).then(|| Duration::from_millis(self.auto_save_interval_ms))
    }

    /// The absolute backing file path these options refer to.
    pub fn resolved_path(&self) -> PathBuf {
        resolve_path(&self.path, &base_dir())
    }
}

/// Fluent constructor for [`ConfigManager`].
///
/// ```rust,no_run
/// use jsonconf::{shared, ConfigManager, ConfigSchema};
///
/// #[derive(Default)]
/// struct Limits {
///     max_connections: u32,
/// }
///
/// let limits = shared(Limits::default());
/// let manager = ConfigManager::builder_with_schema(
///     ConfigSchema::<Limits>::new().field("MaxConnections", |l| &l.max_connections, |l| {
///         &mut l.max_connections
///     }),
/// )
/// .target(limits)
/// .path("limits.json")
/// .auto_save_interval_ms(1000)
/// .build()?;
/// # Ok::<(), jsonconf::ConfigError>(())
/// ```
pub struct ConfigManagerBuilder<T> {
    target: Option<SharedConfig<T>>,
    schema: Option<ConfigSchema<T>>,
    options: ManagerOptions,
}

impl<T: Send + Sync + 'static> ConfigManagerBuilder<T> {
    /// A builder with neither target nor schema.
    pub fn new() -> Self {
        Self {
            target: None,
            schema: None,
            options: ManagerOptions::default(),
        }
    }

    /// The settings object to load into and save from.  Required.
    #[must_use]
    pub fn target(mut self, target: SharedConfig<T>) -> Self {
        self.target = Some(target);
        self
    }

    /// The persisted members of the target.  Required unless the builder was
    /// created from a [`ConfigTarget`] type.
    #[must_use]
    pub fn schema(mut self, schema: ConfigSchema<T>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Replaces all options at once.
    #[must_use]
    pub fn options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.path = path.into();
        self
    }

    /// Auto-save period in milliseconds; `0` disables auto-save.
    #[must_use]
    pub fn auto_save_interval_ms(mut self, millis: u64) -> Self {
        self.options.auto_save_interval_ms = millis;
        self
    }

    /// Auto-save period; a zero duration disables auto-save.
    #[must_use]
    pub fn auto_save_interval(mut self, interval: Duration) -> Self {
        self.options.auto_save_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn escaping(mut self, escaping: Escaping) -> Self {
        self.options.escaping = escaping;
        self
    }

    #[must_use]
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.options.create_dirs = create_dirs;
        self
    }

    /// Opens the backing file, loads it, and starts auto-save if configured.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidArgument`] if the target or schema is missing
    ///   or the schema repeats a member name.  Reported before any I/O.
    /// - [`ConfigError::Load`] if the file cannot be opened, read, parsed, or
    ///   applied, or the empty file cannot be populated.
    /// - [`ConfigError::AutoSaveSpawn`] if the worker thread cannot start.
    pub fn build(self) -> Result<ConfigManager<T>, ConfigError> {
        let target = self.target.ok_or(ArgumentError::MissingTarget)?;
        let schema = self.schema.ok_or(ArgumentError::MissingSchema)?;
        schema.validate()?;
        ConfigManager::start(target, schema, self.options)
    }
}

impl<T: ConfigTarget> ConfigManagerBuilder<T> {
    /// A builder whose schema comes from `T::schema()`.
    pub fn for_target() -> Self {
        Self::new().schema(T::schema())
    }
}

impl<T: Send + Sync + 'static> Default for ConfigManagerBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
