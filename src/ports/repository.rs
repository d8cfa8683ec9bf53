//! Repository port for trained value functions.

use std::path::Path;

use crate::{Result, q_learning::SavedValueFunction};

/// Port for persisting and loading trained approximators.
///
/// # Examples
///
/// ```no_run
/// use gridseek::ports::ValueFunctionRepository;
/// use gridseek::q_learning::SavedValueFunction;
/// use std::path::Path;
///
/// fn checkpoint<R: ValueFunctionRepository>(
///     repo: &R,
///     saved: &SavedValueFunction,
/// ) -> gridseek::Result<()> {
///     repo.save(saved, Path::new("weights.msgpack"))
/// }
/// ```
pub trait ValueFunctionRepository {
    /// Save a value function to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be written or serialization
    /// fails.
    fn save(&self, saved: &SavedValueFunction, path: &Path) -> Result<()>;

    /// Load a value function from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is stored at `path` or the data cannot be
    /// decoded.
    fn load(&self, path: &Path) -> Result<SavedValueFunction>;
}
