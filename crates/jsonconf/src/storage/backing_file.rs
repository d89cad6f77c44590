//! The backing file: one JSON document held open for the manager's lifetime.
//!
//! # Sharing rules
//!
//! The file is opened for reading and writing and stays open until the
//! manager is closed.  Other processes may open it for reading; a second
//! writer is turned away:
//!
//! | Platform | Mechanism                                                  |
//! |----------|------------------------------------------------------------|
//! | Windows  | `FILE_SHARE_READ` share mode: other write opens fail       |
//! | Unix     | exclusive advisory lock (`flock`) via [`File::try_lock`]   |
//!
//! On Unix the lock is advisory: it stops other lock-aware writers (for
//! example a second `ConfigManager` on the same path) but not a plain
//! `echo > config.json`.
//!
//! # Path resolution
//!
//! A relative path is resolved against the directory of the running
//! executable, not the current working directory, so a service started from
//! an arbitrary directory still finds the `config.json` shipped beside it.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use jsonconf_core::LoadError;
use tracing::debug;

/// File name used when the caller does not supply a path.
pub const DEFAULT_FILE_NAME: &str = "config.json";

#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;
#[cfg(windows)]
const ERROR_SHARING_VIOLATION: i32 = 32;

/// Returns the directory relative paths are resolved against.
///
/// This is the directory containing the running executable.  Falls back to
/// the current working directory, then to `.`, when that cannot be
/// determined.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Joins `path` onto `base` unless it is already absolute.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Exclusive read/write handle on the backing file.
#[derive(Debug)]
pub struct BackingFile {
    path: PathBuf,
    file: File,
}

impl BackingFile {
    /// Opens `path`, creating it when absent, and takes the writer lock.
    ///
    /// With `create_dirs`, missing parent directories are created first.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Locked`] if another writer holds the file.
    /// - [`LoadError::Io`] for any other open failure.
    pub fn open(path: &Path, create_dirs: bool) -> Result<Self, LoadError> {
        if create_dirs {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
        }

        let file = open_options().open(path).map_err(map_open_error)?;
        lock_exclusive(&file)?;

        debug!(path = %path.display(), "opened backing file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the file in bytes.
    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Reads the whole file from the start.
    ///
    /// Invalid UTF-8 is reported as [`io::ErrorKind::InvalidData`].
    pub fn read_all(&mut self) -> io::Result<String> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut text = String::new();
        self.file.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Replaces the whole content of the file with `bytes`.
    ///
    /// Truncates, writes from offset 0, then syncs data to disk.
    pub fn overwrite(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;
        self.file.sync_data()
    }
}

#[cfg(windows)]
fn open_options() -> OpenOptions {
    use std::os::windows::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .share_mode(FILE_SHARE_READ);
    options
}

#[cfg(not(windows))]
fn open_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    options
}

#[cfg(windows)]
fn map_open_error(err: io::Error) -> LoadError {
    if err.raw_os_error() == Some(ERROR_SHARING_VIOLATION) {
        LoadError::Locked
    } else {
        LoadError::Io(err)
    }
}

#[cfg(not(windows))]
fn map_open_error(err: io::Error) -> LoadError {
    LoadError::Io(err)
}

// The share mode already excludes other writers on Windows, and a
// `LockFileEx` range lock would also block readers.
#[cfg(windows)]
fn lock_exclusive(_file: &File) -> Result<(), LoadError> {
    Ok(())
}

#[cfg(not(windows))]
fn lock_exclusive(file: &File) -> Result<(), LoadError> {
    use std::fs::TryLockError;

    match file.try_lock() {
        Ok(()) => Ok(()),
        Err(TryLockError::WouldBlock) => Err(LoadError::Locked),
        Err(TryLockError::Error(err)) => Err(LoadError::Io(err)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
