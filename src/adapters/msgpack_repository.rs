//! MessagePack implementation of the value-function repository.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    Result, error::Error, ports::ValueFunctionRepository, q_learning::SavedValueFunction,
};

/// MessagePack-based repository.
///
/// Writes through `rmp_serde`; parent directories are not created.
///
/// # Examples
///
/// ```no_run
/// use gridseek::adapters::MsgPackRepository;
/// use gridseek::ports::ValueFunctionRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let saved = repo.load(Path::new("weights.msgpack"))?;
/// println!("trained for {} episodes", saved.metadata.episodes_trained);
/// # Ok::<(), gridseek::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl ValueFunctionRepository for MsgPackRepository {
    fn save(&self, saved: &SavedValueFunction, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, saved).map_err(|e| {
            Error::SerializationContext {
                operation: "serialize value function to MessagePack".to_string(),
                message: e.to_string(),
            }
        })?;

        writer.flush().map_err(|source| Error::Io {
            operation: format!("write file {path:?}"),
            source,
        })
    }

    fn load(&self, path: &Path) -> Result<SavedValueFunction> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(BufReader::new(file)).map_err(|e| {
            Error::SerializationContext {
                operation: "deserialize value function from MessagePack".to_string(),
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        ports::ValueFunction,
        q_learning::{Approximator, ApproximatorKind, OutputActivation, TrainingMetadata},
        types::MapSize,
    };

    fn saved() -> SavedValueFunction {
        let approximator = Approximator::build(
            ApproximatorKind::Network,
            MapSize::new(4, 4).unwrap(),
            OutputActivation::Linear,
            Some(21),
        )
        .expect("Failed to build approximator");
        SavedValueFunction::new(
            approximator,
            TrainingMetadata {
                episodes_trained: 12,
                ..TrainingMetadata::default()
            },
        )
    }

    #[test]
    fn test_msgpack_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("weights.msgpack");

        let repo = MsgPackRepository::new();
        let original = saved();
        repo.save(&original, &file_path).expect("Failed to save");
        let loaded = repo.load(&file_path).expect("Failed to load");

        assert_eq!(loaded.metadata, original.metadata);
        let features = vec![0.0; 16];
        assert_eq!(
            loaded.approximator.evaluate(&features).unwrap(),
            original.approximator.evaluate(&features).unwrap()
        );
    }

    #[test]
    fn test_load_nonexistent_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = MsgPackRepository::new();
        let result = repo.load(&temp_dir.path().join("missing.msgpack"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_load_garbage_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("garbage.msgpack");
        std::fs::write(&file_path, b"not a value function").unwrap();
        let result = MsgPackRepository::new().load(&file_path);
        assert!(matches!(result, Err(Error::SerializationContext { .. })));
    }

    #[test]
    fn test_save_to_invalid_path_returns_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = MsgPackRepository::new();
        let result = repo.save(&saved(), &temp_dir.path().join("no_dir/file.msgpack"));
        assert!(result.is_err());
    }
}
