//! Error taxonomy shared by every engine component.

use crate::config::RunConfigError;
use crate::items::ItemId;
use crate::roles::RoleId;
use thiserror::Error;

/// Errors raised by the mission and combat engine.
///
/// Everything except [`GameError::InvariantViolation`] is recoverable at the
/// boundary: the caller can reprompt and retry with a different decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("no {item} left in inventory")]
    InsufficientItem { item: ItemId },
    #[error("{item} can only be used by the {required} role (current role: {actual})")]
    RoleMismatch {
        item: ItemId,
        required: RoleId,
        actual: RoleId,
    },
    #[error("{item} has no use effect")]
    ItemNotUsable { item: ItemId },
    #[error("state invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Config(#[from] RunConfigError),
}

impl GameError {
    /// Whether the run may continue after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invariant_violations_are_fatal() {
        assert!(GameError::UnknownRole("pilot".into()).is_recoverable());
        assert!(GameError::InvalidState("run is over").is_recoverable());
        assert!(
            GameError::InsufficientItem {
                item: ItemId::MedPack
            }
            .is_recoverable()
        );
        assert!(!GameError::InvariantViolation("hp 4".into()).is_recoverable());
    }

    #[test]
    fn messages_name_the_item_and_roles() {
        let err = GameError::RoleMismatch {
            item: ItemId::Toolkit,
            required: RoleId::Engineer,
            actual: RoleId::Medic,
        };
        assert_eq!(
            err.to_string(),
            "Toolkit can only be used by the Engineer role (current role: Medic)"
        );
    }
}
