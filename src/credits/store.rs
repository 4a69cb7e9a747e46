// src/credits/store.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Raw key/value persistence for credit records, one JSON document per scope.
pub trait CreditStore {
    fn read(&self, scope: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, scope: &str, json: &str) -> Result<(), StoreError>;
}

impl<T: CreditStore + ?Sized> CreditStore for &T {
    fn read(&self, scope: &str) -> Result<Option<String>, StoreError> {
        (**self).read(scope)
    }

    fn write(&self, scope: &str, json: &str) -> Result<(), StoreError> {
        (**self).write(scope, json)
    }
}

/// Anonymous sessions share this scope. No escaped email can produce it.
pub const ANONYMOUS_SCOPE: &str = "_anonymous";

/// Storage scope for an identity. ASCII letters and digits are kept and
/// every other byte becomes `_xx` (hex), so distinct emails never share a
/// scope.
pub fn scope_key(email: Option<&str>) -> String {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return ANONYMOUS_SCOPE.into();
    };

    let mut key = String::with_capacity(email.len());
    for b in email.to_lowercase().bytes() {
        if b.is_ascii_alphanumeric() {
            key.push(b as char);
        } else {
            key.push_str(&format!("_{:02x}", b));
        }
    }
    key
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Stores each scope as `credits-<scope>.json` inside a data directory.
#[derive(Debug, Clone)]
pub struct FileCreditStore {
    dir: PathBuf,
}

impl FileCreditStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, scope: &str) -> PathBuf {
        self.dir.join(format!("credits-{}.json", scope))
    }
}

impl CreditStore for FileCreditStore {
    fn read(&self, scope: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(scope);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn write(&self, scope: &str, json: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        write_atomic(&self.path_for(scope), json)
    }
}

/// Write through a sibling temp file so readers never see a partial record.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, contents).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[cfg(test)]
pub use memory::MemoryCreditStore;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, PoisonError};

    use super::CreditStore;
    use crate::error::StoreError;

    /// In-process store; clones share the same map.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryCreditStore(pub(super) Arc<Mutex<HashMap<String, String>>>);

    impl CreditStore for MemoryCreditStore {
        fn read(&self, scope: &str) -> Result<Option<String>, StoreError> {
            let map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            Ok(map.get(scope).cloned())
        }

        fn write(&self, scope: &str, json: &str) -> Result<(), StoreError> {
            let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            map.insert(scope.to_string(), json.to_string());
            Ok(())
        }
    }
}
