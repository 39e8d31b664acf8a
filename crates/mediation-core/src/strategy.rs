//! Pedagogical strategy vocabulary and turn-facing labels.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A real pedagogical strategy, in escalation order.
///
/// The order of the variants mirrors the escalation hierarchy used by the
/// router's scan (`Strategy::HIERARCHY`): earlier variants are tried before
/// later ones. `TeacherEscalation` is the terminal strategy and is never a
/// scan candidate — it is returned only when the hierarchy is exhausted or
/// the test-mode ceiling is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    EmotionalSupport,
    HighlightKeywords,
    GuidedReading,
    ProvideExample,
    BreakdownSteps,
    DetailedExplanation,
    TeacherEscalation,
}

impl Strategy {
    /// Escalation order scanned by the router. Excludes the terminal strategy.
    pub const HIERARCHY: [Strategy; 6] = [
        Strategy::EmotionalSupport,
        Strategy::HighlightKeywords,
        Strategy::GuidedReading,
        Strategy::ProvideExample,
        Strategy::BreakdownSteps,
        Strategy::DetailedExplanation,
    ];

    /// Whether this strategy may ever be recorded into `failed_strategies`.
    /// `TeacherEscalation` is terminal and is excluded (invariant I1).
    pub fn is_real(&self) -> bool {
        !matches!(self, Strategy::TeacherEscalation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::EmotionalSupport => "emotional_support",
            Strategy::HighlightKeywords => "highlight_keywords",
            Strategy::GuidedReading => "guided_reading",
            Strategy::ProvideExample => "provide_example",
            Strategy::BreakdownSteps => "breakdown_steps",
            Strategy::DetailedExplanation => "detailed_explanation",
            Strategy::TeacherEscalation => "teacher_escalation",
        }
    }
}

/// The outcome label recorded on a turn. Includes the seven real strategies
/// plus the synthetic, non-routable outcomes used only to describe how a
/// turn concluded.
///
/// Serializes as a single flat string (`as_str()`), not the derived
/// externally-tagged representation a newtype variant would otherwise get —
/// the wire contract requires `strategy_used` to carry the verbatim
/// identifier (e.g. `"teacher_escalation"`), never `{"strategy":"..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyOutcome {
    Strategy(Strategy),
    InitialGreeting,
    OpenQuestion,
    ErrorFallback,
    ServiceFallback,
}

impl StrategyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyOutcome::Strategy(s) => s.as_str(),
            StrategyOutcome::InitialGreeting => "initial_greeting",
            StrategyOutcome::OpenQuestion => "open_question",
            StrategyOutcome::ErrorFallback => "error_fallback",
            StrategyOutcome::ServiceFallback => "service_fallback",
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        Some(match value {
            "emotional_support" => StrategyOutcome::Strategy(Strategy::EmotionalSupport),
            "highlight_keywords" => StrategyOutcome::Strategy(Strategy::HighlightKeywords),
            "guided_reading" => StrategyOutcome::Strategy(Strategy::GuidedReading),
            "provide_example" => StrategyOutcome::Strategy(Strategy::ProvideExample),
            "breakdown_steps" => StrategyOutcome::Strategy(Strategy::BreakdownSteps),
            "detailed_explanation" => StrategyOutcome::Strategy(Strategy::DetailedExplanation),
            "teacher_escalation" => StrategyOutcome::Strategy(Strategy::TeacherEscalation),
            "initial_greeting" => StrategyOutcome::InitialGreeting,
            "open_question" => StrategyOutcome::OpenQuestion,
            "error_fallback" => StrategyOutcome::ErrorFallback,
            "service_fallback" => StrategyOutcome::ServiceFallback,
            _ => return None,
        })
    }
}

impl From<Strategy> for StrategyOutcome {
    fn from(s: Strategy) -> Self {
        StrategyOutcome::Strategy(s)
    }
}

impl Serialize for StrategyOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

struct StrategyOutcomeVisitor;

impl<'de> Visitor<'de> for StrategyOutcomeVisitor {
    type Value = StrategyOutcome;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a strategy outcome identifier string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        StrategyOutcome::from_str(value)
            .ok_or_else(|| de::Error::unknown_variant(value, KNOWN_STRATEGY_OUTCOMES))
    }
}

const KNOWN_STRATEGY_OUTCOMES: &[&str] = &[
    "emotional_support",
    "highlight_keywords",
    "guided_reading",
    "provide_example",
    "breakdown_steps",
    "detailed_explanation",
    "teacher_escalation",
    "initial_greeting",
    "open_question",
    "error_fallback",
    "service_fallback",
];

impl<'de> Deserialize<'de> for StrategyOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(StrategyOutcomeVisitor)
    }
}

/// A learner utterance's comprehension classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComprehensionLabel {
    #[default]
    Initial,
    Emotional,
    Confused,
    Understood,
    Partial,
}

/// Session mode. In `Test`, the router enforces an escalation ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Practice,
    Test,
}

impl Mode {
    /// Maximum distinct failed strategies tolerated in `Test` mode before
    /// the router forces `teacher_escalation`.
    pub const TEST_MODE_CEILING: usize = 3;
}

/// Explicit caller-supplied assistance request, which overrides routing
/// except when comprehension is `Emotional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistanceType {
    Explain,
    Breakdown,
    Example,
}

impl AssistanceType {
    pub fn target_strategy(&self) -> Strategy {
        match self {
            AssistanceType::Explain => Strategy::DetailedExplanation,
            AssistanceType::Breakdown => Strategy::BreakdownSteps,
            AssistanceType::Example => Strategy::ProvideExample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_excludes_terminal_strategy() {
        assert!(!Strategy::HIERARCHY.contains(&Strategy::TeacherEscalation));
        assert_eq!(Strategy::HIERARCHY.len(), 6);
    }

    #[test]
    fn wire_names_are_stable() {
        assert_eq!(Strategy::EmotionalSupport.as_str(), "emotional_support");
        assert_eq!(Strategy::TeacherEscalation.as_str(), "teacher_escalation");
        assert_eq!(
            StrategyOutcome::InitialGreeting.as_str(),
            "initial_greeting"
        );
    }

    #[test]
    fn strategy_outcome_serializes_as_flat_string() {
        assert_eq!(
            serde_json::to_string(&StrategyOutcome::Strategy(Strategy::TeacherEscalation)).unwrap(),
            "\"teacher_escalation\""
        );
        assert_eq!(
            serde_json::to_string(&StrategyOutcome::ErrorFallback).unwrap(),
            "\"error_fallback\""
        );
    }

    #[test]
    fn strategy_outcome_round_trips_through_json() {
        for outcome in [
            StrategyOutcome::Strategy(Strategy::EmotionalSupport),
            StrategyOutcome::Strategy(Strategy::TeacherEscalation),
            StrategyOutcome::InitialGreeting,
            StrategyOutcome::OpenQuestion,
            StrategyOutcome::ErrorFallback,
            StrategyOutcome::ServiceFallback,
        ] {
            let json = serde_json::to_string(&outcome).unwrap();
            let parsed: StrategyOutcome = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, outcome);
        }
    }

    #[test]
    fn assistance_type_maps_to_expected_strategy() {
        assert_eq!(
            AssistanceType::Breakdown.target_strategy(),
            Strategy::BreakdownSteps
        );
        assert_eq!(
            AssistanceType::Example.target_strategy(),
            Strategy::ProvideExample
        );
    }

    #[test]
    fn terminal_strategy_is_not_real() {
        assert!(!Strategy::TeacherEscalation.is_real());
        assert!(Strategy::EmotionalSupport.is_real());
    }
}
