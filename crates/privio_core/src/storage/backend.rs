use crate::error::AppError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const STORE_DIR_ENV_VAR: &str = "PRIVIO_STORE_DIR";

/// A local key-value store holding whole string values.
pub trait StorageBackend: fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replaces the value under `key` in full.
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// `PRIVIO_STORE_DIR`, when set to a non-blank value.
pub fn store_dir_from_env() -> Option<PathBuf> {
    std::env::var(STORE_DIR_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

pub fn default_store_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("privio"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("privio"))
    }
}

fn check_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!("invalid storage key '{key}'")))
    }
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn io_error(path: &Path, err: std::io::Error) -> AppError {
        AppError::io(format!("{}: {}", path.display(), err))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        check_key(key)?;
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        check_key(key)?;
        std::fs::create_dir_all(&self.root).map_err(|err| Self::io_error(&self.root, err))?;

        let path = self.path_for(key);
        let staging = self.root.join(format!(".{key}.json.tmp"));
        std::fs::write(&staging, value).map_err(|err| Self::io_error(&staging, err))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&staging, permissions)
                .map_err(|err| Self::io_error(&staging, err))?;
        }

        std::fs::rename(&staging, &path).map_err(|err| Self::io_error(&path, err))
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        check_key(key)?;
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        check_key(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        check_key(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        check_key(key)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
