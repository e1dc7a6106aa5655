//! In-memory policy repository for testing.
//!
//! This adapter provides a pure in-memory implementation of PolicyRepository,
//! enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Result, error::Error, learning::LearnedPolicy, ports::PolicyRepository};

/// In-memory repository for testing.
///
/// Stores encoded policies in a shared HashMap keyed by path.
///
/// # Examples
///
/// ```
/// use gmenv::adapters::InMemoryRepository;
/// use gmenv::learning::{LearnedPolicy, LearningAlgorithm};
/// use gmenv::ports::PolicyRepository;
/// use std::collections::BTreeMap;
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let policy = LearnedPolicy::new(
///     LearningAlgorithm::A2c,
///     &["go".to_string()],
///     BTreeMap::new(),
///     BTreeMap::new(),
///     None,
/// );
///
/// repo.save(&policy, Path::new("policy"))?;
/// let loaded = repo.load(Path::new("policy"))?;
/// assert_eq!(loaded, policy);
/// # Ok::<(), gmenv::Error>(())
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage.
#[derive(Clone)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of policies currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        let key = path.to_string_lossy().to_string();
        self.storage().contains_key(&key)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRepository for InMemoryRepository {
    fn save(&self, policy: &LearnedPolicy, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec(policy).map_err(|e| Error::SerializationContext {
            operation: "serialize policy for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<LearnedPolicy> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load policy from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize policy from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}
