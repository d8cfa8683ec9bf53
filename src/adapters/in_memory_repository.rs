//! In-memory value-function repository for testing.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    Result, error::Error, ports::ValueFunctionRepository, q_learning::SavedValueFunction,
};

/// In-memory repository for testing.
///
/// Stores encoded value functions in a shared HashMap keyed by path, so tests
/// exercise the same MessagePack encoding without touching the file system.
/// All clones share the same underlying storage.
///
/// # Examples
///
/// ```
/// use gridseek::adapters::InMemoryRepository;
/// use gridseek::ports::ValueFunctionRepository;
/// use gridseek::q_learning::{
///     Approximator, ApproximatorKind, OutputActivation, SavedValueFunction, TrainingMetadata,
/// };
/// use gridseek::types::MapSize;
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let approximator = Approximator::build(
///     ApproximatorKind::Table,
///     MapSize::default(),
///     OutputActivation::Linear,
///     None,
/// )?;
/// let saved = SavedValueFunction::new(approximator, TrainingMetadata::default());
///
/// repo.save(&saved, Path::new("weights"))?;
/// let loaded = repo.load(Path::new("weights"))?;
/// assert_eq!(loaded.version, SavedValueFunction::VERSION);
/// # Ok::<(), gridseek::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of entries currently stored.
    pub fn count(&self) -> usize {
        self.storage().len()
    }

    pub fn clear(&self) {
        self.storage().clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.storage().contains_key(path.to_string_lossy().as_ref())
    }
}

impl ValueFunctionRepository for InMemoryRepository {
    fn save(&self, saved: &SavedValueFunction, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec(saved).map_err(|e| Error::SerializationContext {
            operation: "serialize value function for in-memory storage".to_string(),
            message: e.to_string(),
        })?;

        self.storage().insert(key, bytes);
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedValueFunction> {
        let key = path.to_string_lossy().to_string();
        let storage = self.storage();

        let bytes = storage.get(&key).ok_or_else(|| Error::Io {
            operation: format!("load value function from in-memory storage at {path:?}"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key not found in memory"),
        })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: "deserialize value function from in-memory storage".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        q_learning::{Approximator, ApproximatorKind, OutputActivation, TrainingMetadata},
        types::MapSize,
    };

    fn saved(episodes: usize) -> SavedValueFunction {
        let approximator = Approximator::build(
            ApproximatorKind::Table,
            MapSize::new(3, 3).unwrap(),
            OutputActivation::Linear,
            None,
        )
        .unwrap();
        SavedValueFunction::new(
            approximator,
            TrainingMetadata {
                episodes_trained: episodes,
                ..TrainingMetadata::default()
            },
        )
    }

    #[test]
    fn test_in_memory_save_and_load() {
        let repo = InMemoryRepository::new();
        let path = Path::new("weights");

        assert_eq!(repo.count(), 0);
        assert!(!repo.contains(path));

        repo.save(&saved(5), path).unwrap();
        assert_eq!(repo.count(), 1);
        assert!(repo.contains(path));

        let loaded = repo.load(path).unwrap();
        assert_eq!(loaded.metadata.episodes_trained, 5);
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.load(Path::new("nonexistent")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_clear_removes_all() {
        let repo = InMemoryRepository::new();
        repo.save(&saved(1), Path::new("a")).unwrap();
        repo.save(&saved(2), Path::new("b")).unwrap();
        assert_eq!(repo.count(), 2);

        repo.clear();
        assert_eq!(repo.count(), 0);
    }

    #[test]
    fn test_clone_shares_storage() {
        let repo1 = InMemoryRepository::new();
        let repo2 = repo1.clone();

        repo1.save(&saved(3), Path::new("shared")).unwrap();
        let loaded = repo2.load(Path::new("shared")).unwrap();
        assert_eq!(loaded.metadata.episodes_trained, 3);
        assert_eq!(repo2.count(), 1);
    }
}
