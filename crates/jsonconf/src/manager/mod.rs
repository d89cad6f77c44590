//! [`ConfigManager`]: load at startup, save on demand, auto-save, final save.
//!
//! # Lifecycle
//!
//! ```text
//! build()
//!  ├─ open backing file (create if absent, exclude other writers)
//!  ├─ load
//!  │    ├─ zero-length file → save current values into it
//!  │    └─ otherwise        → parse object, assign matching members
//!  └─ interval > 0 → start auto-save worker
//!
//! save()                      any thread, any time
//!
//! close() / drop
//!  ├─ stop auto-save worker and wait for an in-flight save
//!  ├─ final save
//!  └─ release backing file
//! ```
//!
//! # Concurrency
//!
//! The backing file lives behind a `Mutex` and every save (explicit,
//! automatic, or final) holds it from truncation to sync, so two saves never
//! interleave their writes.  Member values are read under the target's read
//! lock and assigned under its write lock, so a save never observes a
//! half-applied load.

mod options;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use jsonconf_core::{
    decode_document, encode_document, ApplyReport, ConfigError, ConfigSchema, ConfigTarget,
    Escaping, LoadError, SaveError,
};
use tracing::{debug, error, info, warn};

pub use options::{ConfigManagerBuilder, ManagerOptions};

use crate::autosave::AutoSaver;
use crate::storage::BackingFile;

/// A settings object shared across the process.
pub type SharedConfig<T> = Arc<RwLock<T>>;

/// Wraps `value` for sharing with a [`ConfigManager`].
pub fn shared<T>(value: T) -> SharedConfig<T> {
    Arc::new(RwLock::new(value))
}

/// State reachable from both the caller and the auto-save worker.
struct Shared<T> {
    target: SharedConfig<T>,
    schema: ConfigSchema<T>,
    escaping: Escaping,
    path: PathBuf,
    file: Mutex<Option<BackingFile>>,
    saves: AtomicU64,
}

impl<T: Send + Sync + 'static> Shared<T> {
    fn save(&self) -> Result<(), ConfigError> {
        let mut guard = self.file.lock().map_err(|_| self.save_error(SaveError::Poisoned))?;
        let file = guard.as_mut().ok_or_else(|| self.save_error(SaveError::Closed))?;
        self.write_snapshot(file).map_err(|source| self.save_error(source))
    }

    /// Encodes the target and replaces the file content with it.
    ///
    /// The document is fully encoded before the file is truncated, so an
    /// encoding failure leaves the previous content in place.
    fn write_snapshot(&self, file: &mut BackingFile) -> Result<(), SaveError> {
        let snapshot = {
            let target = self.target.read().map_err(|_| SaveError::Poisoned)?;
            self.schema.snapshot(&target)?
        };
        let bytes = encode_document(&snapshot, self.escaping).map_err(SaveError::Encode)?;
        file.overwrite(&bytes)?;

        let count = self.saves.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            path = %self.path.display(),
            members = snapshot.len(),
            bytes = bytes.len(),
            count,
            "saved configuration"
        );
        Ok(())
    }

    /// Loads `file` into the target.  Returns `None` when the file was empty
    /// and has been populated instead.
    fn load(&self, file: &mut BackingFile) -> Result<Option<ApplyReport>, LoadError> {
        if file.is_empty()? {
            debug!(path = %self.path.display(), "backing file is empty; populating it");
            self.write_snapshot(file).map_err(LoadError::Bootstrap)?;
            return Ok(None);
        }

        let text = file.read_all()?;
        let document = decode_document(&text)?;
        let mut target = self.target.write().map_err(|_| LoadError::Poisoned)?;
        let report = self.schema.apply(&mut target, document)?;

        if !report.unknown_keys.is_empty() {
            debug!(keys = ?report.unknown_keys, "ignored keys with no matching member");
        }
        Ok(Some(report))
    }

    /// Drops the file handle, releasing the writer lock.
    fn release(&self) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            debug!(path = %self.path.display(), "released backing file");
        }
    }

    fn save_error(&self, source: SaveError) -> ConfigError {
        ConfigError::Save {
            path: self.path.clone(),
            source,
        }
    }
}

/// Keeps a process-wide settings object in sync with a JSON file.
///
/// Create one per settings object with [`ConfigManager::builder`] (for types
/// implementing [`ConfigTarget`]) or [`ConfigManager::builder_with_schema`].
/// Creating two managers for the same file fails with
/// [`LoadError::Locked`] on the second.
///
/// Dropping the manager performs the same shutdown as [`close`](Self::close)
/// but can only log a failed final save; call `close` to observe it.
pub struct ConfigManager<T: Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    auto_saver: Option<AutoSaver>,
    closed: bool,
}

impl<T: ConfigTarget> ConfigManager<T> {
    /// A builder whose schema comes from `T::schema()`.
    pub fn builder() -> ConfigManagerBuilder<T> {
        ConfigManagerBuilder::for_target()
    }

    /// Opens `config.json` beside the executable with auto-save disabled.
    ///
    /// # Errors
    ///
    /// See [`ConfigManagerBuilder::build`].
    pub fn open(target: SharedConfig<T>) -> Result<Self, ConfigError> {
        Self::builder().target(target).build()
    }
}

impl<T: Send + Sync + 'static> ConfigManager<T> {
    /// A builder for a target described by an explicit schema.
    pub fn builder_with_schema(schema: ConfigSchema<T>) -> ConfigManagerBuilder<T> {
        ConfigManagerBuilder::new().schema(schema)
    }

    fn start(
        target: SharedConfig<T>,
        schema: ConfigSchema<T>,
        options: ManagerOptions,
    ) -> Result<Self, ConfigError> {
        let path = options.resolved_path();
        let load_error = |source| ConfigError::Load {
            path: path.clone(),
            source,
        };

        let mut file = BackingFile::open(&path, options.create_dirs).map_err(load_error)?;
        let mut shared = Shared {
            target,
            schema,
            escaping: options.escaping,
            path: path.clone(),
            file: Mutex::new(None),
            saves: AtomicU64::new(0),
        };

        match shared.load(&mut file).map_err(load_error)? {
            Some(report) => info!(
                path = %path.display(),
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                unknown = report.unknown_keys.len(),
                "loaded configuration"
            ),
            None => info!(path = %path.display(), "created configuration file from current values"),
        }
        shared.file = Mutex::new(Some(file));
        let shared = Arc::new(shared);

        let auto_saver = match options.auto_save_interval() {
            Some(interval) => Some(spawn_auto_saver(Arc::clone(&shared), interval)?),
            None => None,
        };

        Ok(Self {
            shared,
            auto_saver,
            closed: false,
        })
    }

    /// Writes the current member values to the backing file.
    ///
    /// Safe to call from any thread, including while an auto-save runs; the
    /// two are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Save`] if a member cannot be encoded or the file
    /// cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.shared.save()
    }

    /// Stops auto-save, performs a final save, and releases the file.
    ///
    /// # Errors
    ///
    /// Returns the final save's error.  The file is released either way.
    pub fn close(mut self) -> Result<(), ConfigError> {
        self.shutdown()
    }

    /// The settings object this manager persists.
    pub fn target(&self) -> &SharedConfig<T> {
        &self.shared.target
    }

    /// The resolved, absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// The auto-save period, or `None` when auto-save is disabled.
    pub fn auto_save_interval(&self) -> Option<Duration> {
        self.auto_saver.as_ref().map(AutoSaver::interval)
    }

    pub fn escaping(&self) -> Escaping {
        self.shared.escaping
    }

    /// Number of successful saves so far, including the one that populates
    /// an empty file during construction.
    pub fn save_count(&self) -> u64 {
        self.shared.saves.load(Ordering::Relaxed)
    }

    fn shutdown(&mut self) -> Result<(), ConfigError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(mut saver) = self.auto_saver.take() {
            saver.stop();
        }
        let result = self.shared.save();
        self.shared.release();
        result
    }
}

impl<T: Send + Sync + 'static> Drop for ConfigManager<T> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            error!(error = %error_chain(&err), "final configuration save failed");
        }
    }
}

fn spawn_auto_saver<T: Send + Sync + 'static>(
    shared: Arc<Shared<T>>,
    interval: Duration,
) -> Result<AutoSaver, ConfigError> {
    AutoSaver::spawn(interval, move || {
        if let Err(err) = shared.save() {
            warn!(error = %error_chain(&err), "auto-save failed; retrying next interval");
        }
    })
    .map_err(ConfigError::AutoSaveSpawn)
}

/// Formats an error and its sources as `outer: inner: root`.
fn error_chain(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use jsonconf_core::FieldDescriptor;

    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Settings {
        value1: i32,
        value2: HashMap<String, String>,
        value3: String,
        session: String,
    }

    impl ConfigTarget for Settings {
        fn schema() -> ConfigSchema<Self> {
            ConfigSchema::<Self>::new()
                .field("Value1", |s| &s.value1, |s| &mut s.value1)
                .field("Value2", |s| &s.value2, |s| &mut s.value2)
                .field("Value3", |s| &s.value3, |s| &mut s.value3)
                .with(
                    FieldDescriptor::field("Session", |s: &Self| &s.session, |s| &mut s.session)
                        .ignored(),
                )
        }
    }

    fn open_in(dir: &Path) -> ConfigManager<Settings> {
        ConfigManager::builder()
            .target(shared(Settings::default()))
            .path(dir.join("config.json"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_file_is_populated_by_exactly_one_save() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();

        // Act
        let manager = open_in(dir.path());

        // Assert
        assert_eq!(manager.save_count(), 1);
        let text = std::fs::read_to_string(manager.path()).unwrap();
        assert_eq!(
            text,
            "{\n  \"Value1\": 0,\n  \"Value2\": {},\n  \"Value3\": \"\"\n}"
        );
    }

    #[test]
    fn test_existing_file_is_loaded_without_saving() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"Value1": 10}"#).unwrap();

        // Act
        let manager = open_in(dir.path());

        // Assert
        assert_eq!(manager.save_count(), 0);
        assert_eq!(manager.target().read().unwrap().value1, 10);
    }

    #[test]
    fn test_save_after_close_reports_closed() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let mut manager = open_in(dir.path());
        manager.shutdown().unwrap();

        // Act
        let result = manager.save();

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::Save {
                source: SaveError::Closed,
                ..
            })
        ));
    }

    #[test]
    fn test_shutdown_twice_saves_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = open_in(dir.path());
        manager.shutdown().unwrap();
        manager.shutdown().unwrap();
        assert_eq!(manager.save_count(), 2);
    }

    #[test]
    fn test_relative_path_resolves_beside_executable() {
        // Arrange
        let name = format!("jsonconf-relative-{}.json", std::process::id());
        let expected = std::env::current_exe()
            .unwrap()
            .parent()
            .unwrap()
            .join(&name);

        // Act
        let manager = ConfigManager::builder()
            .target(shared(Settings::default()))
            .path(&name)
            .build()
            .unwrap();
        let resolved = manager.path().to_path_buf();
        manager.close().unwrap();
        std::fs::remove_file(&resolved).unwrap();

        // Assert
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_path_is_absolute_after_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let manager = open_in(dir.path());
        assert!(manager.path().is_absolute());
    }

    #[test]
    fn test_auto_save_interval_reported_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let manager = open_in(dir.path());
        assert_eq!(manager.auto_save_interval(), None);
        drop(manager);

        let manager = ConfigManager::builder()
            .target(shared(Settings::default()))
            .path(dir.path().join("config.json"))
            .auto_save_interval_ms(60_000)
            .build()
            .unwrap();
        assert_eq!(manager.auto_save_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let err = ConfigError::Save {
            path: PathBuf::from("c.json"),
            source: SaveError::Closed,
        };
        assert_eq!(
            error_chain(&err),
            "error saving configuration to c.json: backing file has been closed"
        );
    }
}
