//! Configuration mutation notifications.
//!
//! Every change to a configuration is classified by a [`MutationType`] and reported,
//! synchronously and before the change is applied, to each registered
//! [`MutationValidator`]. The root metadata cache is such a validator: it drops its
//! snapshot when a mutation that affects root metadata is announced.

use std::fmt;

/// Classification of a configuration-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationType {
    /// Declared dependencies changed (including new configurations)
    Dependencies,
    /// Declared artifacts changed
    Artifacts,
    /// Attributes of a configuration or of its dependencies changed
    DependencyAttributes,
    /// Only the resolution strategy changed
    Strategy,
    /// Consumable/resolvable roles changed
    Role,
}

impl MutationType {
    /// Whether a mutation of this kind makes cached root metadata stale.
    pub const fn invalidates_root_metadata(self) -> bool {
        matches!(self, Self::Dependencies | Self::Artifacts | Self::DependencyAttributes)
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dependencies => "dependencies",
            Self::Artifacts => "artifacts",
            Self::DependencyAttributes => "dependency attributes",
            Self::Strategy => "resolution strategy",
            Self::Role => "role",
        };
        f.write_str(name)
    }
}

/// Receives mutation notifications before a configuration change is applied.
///
/// Implementations must finish their bookkeeping before returning: once
/// `validate_mutation` returns, the mutation proceeds and no stale state may remain
/// observable.
pub trait MutationValidator: Send + Sync {
    /// Called with the kind of mutation about to happen.
    fn validate_mutation(&self, kind: MutationType);
}
