use crate::types::{BlockPos, ParticipantId};
use thiserror::Error;

/// Failures reported back to the participant (or admin) who invoked an operation.
/// No state is mutated when one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum DuelError {
    // Validation
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("You are not allowed to manage duel arenas")]
    NotAdmin,

    #[error("Player {0} is not online")]
    UnknownParticipant(String),

    #[error("You cannot challenge yourself")]
    SelfChallenge,

    #[error("{0} does not have permission to duel")]
    MissingPermission(ParticipantId),

    #[error("You are already in a duel")]
    AlreadyInMatch,

    #[error("{0} is already in a duel")]
    OpponentInMatch(ParticipantId),

    #[error("You already challenged {0}")]
    DuplicateRequest(ParticipantId),

    #[error("No pending duel request between {0} and {1}")]
    NoSuchRequest(ParticipantId, ParticipantId),

    #[error("You are already waiting in the matchmaking queue")]
    AlreadyQueued,

    #[error("You are not in the matchmaking queue")]
    NotQueued,

    #[error("You are not in a duel")]
    NotInMatch,

    // Resolution
    #[error("Unknown arena '{0}'")]
    UnknownConfiguration(String),

    #[error("Arena '{0}' is already in use")]
    ConfigurationBusy(String),

    #[error("No arena is free right now")]
    NoFreeConfiguration,

    #[error("Unknown loadout '{0}'")]
    UnknownLoadout(String),

    #[error("Loadout '{0}' is already registered")]
    DuplicateLoadout(String),

    #[error("No container at {0}")]
    NotAContainer(BlockPos),
}

/// Failures of individual host primitives
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    #[error("participant {0} is not present")]
    Absent(ParticipantId),

    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),

    #[error("modifier {id} rejected: {reason}")]
    InvalidModifier { id: String, reason: String },

    #[error("host call failed: {0}")]
    Host(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_subject() {
        let err = DuelError::OpponentInMatch(ParticipantId::new("alex"));
        assert_eq!(err.to_string(), "alex is already in a duel");
        let err = DuelError::NotAContainer(BlockPos::new(1, 2, 3));
        assert_eq!(err.to_string(), "No container at 1 2 3");
    }
}
