//! Repository port for learned-policy persistence.

use std::path::Path;

use crate::{Result, learning::LearnedPolicy};

/// Port for persisting and loading learned policies.
///
/// # Examples
///
/// ```no_run
/// use gmenv::ports::PolicyRepository;
/// use gmenv::learning::LearnedPolicy;
/// use std::path::Path;
///
/// fn save_policy<R: PolicyRepository>(
///     repo: &R,
///     policy: &LearnedPolicy,
///     path: &Path,
/// ) -> gmenv::Result<()> {
///     repo.save(policy, path)
/// }
/// ```
pub trait PolicyRepository {
    /// Save a policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization fails.
    fn save(&self, policy: &LearnedPolicy, path: &Path) -> Result<()>;

    /// Load a policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be decoded.
    fn load(&self, path: &Path) -> Result<LearnedPolicy>;
}
