//! # jsonconf
//!
//! Keeps a process-wide settings object in sync with a JSON file: values are
//! loaded once at startup, saved on demand, optionally auto-saved on a fixed
//! interval, and saved one last time when the manager is closed or dropped.
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//!
//! use jsonconf::{shared, ConfigManager, ConfigSchema, ConfigTarget, FieldDescriptor};
//!
//! #[derive(Default)]
//! struct Settings {
//!     value1: i32,
//!     value2: HashMap<String, String>,
//!     value3: String,
//!     api_key: String,
//! }
//!
//! impl ConfigTarget for Settings {
//!     fn schema() -> ConfigSchema<Self> {
//!         ConfigSchema::<Self>::new()
//!             .field("Value1", |s| &s.value1, |s| &mut s.value1)
//!             .field("Value2", |s| &s.value2, |s| &mut s.value2)
//!             .field("Value3", |s| &s.value3, |s| &mut s.value3)
//!             // Never written to disk, never read from it.
//!             .with(
//!                 FieldDescriptor::field("ApiKey", |s: &Self| &s.api_key, |s| &mut s.api_key)
//!                     .ignored(),
//!             )
//!     }
//! }
//!
//! let settings = shared(Settings::default());
//! let manager = ConfigManager::builder()
//!     .target(settings.clone())
//!     .auto_save_interval_ms(1000)
//!     .build()?;
//!
//! settings.write().unwrap().value3 = "test123".to_string();
//! manager.close()?; // stops auto-save, saves, releases the file
//! # Ok::<(), jsonconf::ConfigError>(())
//! ```
//!
//! # Layout
//!
//! ```text
//! jsonconf
//!   ├── manager/   ConfigManager, builder, ManagerOptions
//!   ├── autosave   re-arming background save worker
//!   └── storage/   backing file handle, path resolution
//! jsonconf-core    schema, exclusion marker, codec, errors (re-exported here)
//! ```

pub mod autosave;
pub mod manager;
pub mod storage;

pub use jsonconf_core::{
    ApplyReport, ArgumentError, ConfigError, ConfigSchema, ConfigTarget, Document, Escaping,
    FieldDescriptor, LoadError, SaveError, Snapshot,
};
pub use manager::{shared, ConfigManager, ConfigManagerBuilder, ManagerOptions, SharedConfig};
