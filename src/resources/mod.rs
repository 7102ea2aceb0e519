//! Idempotent resource primitives (check + apply pattern).
pub mod backup;
pub mod clone;
pub mod fs;
pub mod package;
pub mod symlink;
pub mod template;

use anyhow::Result;

use backup::BackupRecord;

/// State of a resource.
///
/// # Examples
///
/// ```
/// use bootstrap_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let wrong = ResourceState::Incorrect { current: "points to /old".into() };
///
/// assert_ne!(missing, ResourceState::Correct);
/// assert_ne!(wrong, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// Description of what is there now.
        current: String,
    },
    /// Resource cannot be applied as declared (e.g. its source is missing).
    Invalid {
        /// Why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created or updated.
    Applied,
    /// Something in the way was moved aside first, then the resource was applied.
    BackedUp {
        /// Where the displaced file or directory now lives.
        backup: BackupRecord,
    },
    /// Resource was already correct.
    AlreadyCorrect,
}

/// A desired piece of machine state that can be checked and converged.
pub trait Resource {
    /// Human-readable description.
    fn description(&self) -> String;

    /// Inspect the current state without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined.
    fn current_state(&self) -> Result<ResourceState>;

    /// Converge the resource. Calling this on a resource that is already
    /// [`ResourceState::Correct`] returns [`ResourceChange::AlreadyCorrect`].
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be applied.
    fn apply(&self) -> Result<ResourceChange>;

    /// Whether [`apply`](Self::apply) would change anything.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`current_state`](Self::current_state).
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}
