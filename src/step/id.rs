//! Step identifiers.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::PlannerError;

/// Token used on the command line for the plan review checkpoint.
pub const CHECKPOINT_TOKEN: &str = "review";

/// Position in the workflow: a numbered step or the plan review checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Numbered(u32),
    Checkpoint,
}

impl StepId {
    /// The step number, or `None` for the checkpoint.
    pub fn number(&self) -> Option<u32> {
        match self {
            Self::Numbered(n) => Some(*n),
            Self::Checkpoint => None,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(n) => write!(f, "{}", n),
            Self::Checkpoint => write!(f, "{}", CHECKPOINT_TOKEN),
        }
    }
}

impl FromStr for StepId {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(CHECKPOINT_TOKEN)
            || trimmed.eq_ignore_ascii_case("checkpoint")
        {
            return Ok(Self::Checkpoint);
        }
        match trimmed.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(Self::Numbered(n)),
            _ => Err(PlannerError::InvalidStep { raw: s.to_string() }),
        }
    }
}

impl From<u32> for StepId {
    fn from(n: u32) -> Self {
        Self::Numbered(n)
    }
}

// Numbered steps serialize as integers, the checkpoint as its token.
impl Serialize for StepId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numbered(n) => serializer.serialize_u32(*n),
            Self::Checkpoint => serializer.serialize_str(CHECKPOINT_TOKEN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbered() {
        assert_eq!("6".parse::<StepId>().unwrap(), StepId::Numbered(6));
        assert_eq!(" 13 ".parse::<StepId>().unwrap(), StepId::Numbered(13));
    }

    #[test]
    fn test_parse_checkpoint_tokens() {
        assert_eq!("review".parse::<StepId>().unwrap(), StepId::Checkpoint);
        assert_eq!("Checkpoint".parse::<StepId>().unwrap(), StepId::Checkpoint);
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert!(matches!(
            "0".parse::<StepId>(),
            Err(PlannerError::InvalidStep { .. })
        ));
        assert!(matches!(
            "-3".parse::<StepId>(),
            Err(PlannerError::InvalidStep { .. })
        ));
        assert!(matches!(
            "approve".parse::<StepId>(),
            Err(PlannerError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_display_round_trips_through_cli_token() {
        assert_eq!(StepId::Checkpoint.to_string(), "review");
        assert_eq!(StepId::Numbered(5).to_string(), "5");
    }

    #[test]
    fn test_serialize_mixed_representation() {
        assert_eq!(serde_json::to_string(&StepId::Numbered(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&StepId::Checkpoint).unwrap(),
            "\"review\""
        );
    }
}
