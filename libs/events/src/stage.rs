//! Lifecycle stages.

use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// A point in an event's lifecycle.
///
/// Stages are not a strict chain. `PrePersistence` and `PostPersistence` are
/// optional, `Success` and `Failed` are mutually exclusive outcomes, and both
/// precede `End`. Nothing enforces the order: whichever lifecycle operation is
/// called sets the stage, because persistence layers driving events may skip
/// stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStage {
    #[default]
    Start,
    PrePersistence,
    PostPersistence,
    Success,
    Failed,
    End,
}

impl EventStage {
    /// Every stage, in the order a well-behaved producer visits them.
    pub const ALL: [EventStage; 6] = [
        EventStage::Start,
        EventStage::PrePersistence,
        EventStage::PostPersistence,
        EventStage::Success,
        EventStage::Failed,
        EventStage::End,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStage::Start => "start",
            EventStage::PrePersistence => "pre_persistence",
            EventStage::PostPersistence => "post_persistence",
            EventStage::Success => "success",
            EventStage::Failed => "failed",
            EventStage::End => "end",
        }
    }

    /// Returns true for the outcome markers (`Success`, `Failed`).
    pub fn is_outcome(&self) -> bool {
        matches!(self, EventStage::Success | EventStage::Failed)
    }

    /// Returns true for `End`, after which the event is discarded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStage::End)
    }
}

impl std::fmt::Display for EventStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventStage {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StageError::Unknown(s.to_string()))
    }
}

impl TryFrom<&str> for EventStage {
    type Error = StageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("start", EventStage::Start)]
    #[case("pre_persistence", EventStage::PrePersistence)]
    #[case("POST_PERSISTENCE", EventStage::PostPersistence)]
    #[case("success", EventStage::Success)]
    #[case("failed", EventStage::Failed)]
    #[case("End", EventStage::End)]
    fn test_parse_stage(#[case] input: &str, #[case] expected: EventStage) {
        assert_eq!(input.parse::<EventStage>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        let err = EventStage::try_from("archived").unwrap_err();
        assert_eq!(err, StageError::Unknown("archived".into()));
        assert_eq!(err.to_string(), "unexpected event stage: archived");
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(
            serde_json::to_string(&EventStage::PrePersistence).unwrap(),
            "\"pre_persistence\""
        );
        let stage: EventStage = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(stage, EventStage::Failed);
    }

    #[test]
    fn test_outcome_and_terminal() {
        let outcomes: Vec<_> = EventStage::ALL.iter().filter(|s| s.is_outcome()).collect();
        assert_eq!(outcomes, vec![&EventStage::Success, &EventStage::Failed]);
        assert!(EventStage::End.is_terminal());
        assert!(!EventStage::Failed.is_terminal());
        assert_eq!(EventStage::default(), EventStage::Start);
    }
}
