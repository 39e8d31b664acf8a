//! Per-session conversation state (C4).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::strategy::{ComprehensionLabel, Strategy, StrategyOutcome};

/// Durable per-session mediation state.
///
/// Invariants maintained across every turn:
/// - `failed_strategies` never contains `TeacherEscalation`.
/// - `attempt_count == comprehension_history.len()`.
/// - a change in `current_instruction` resets everything but the
///   instruction itself.
/// - at most one row per `session_id` (enforced by the store, not here).
/// - `last_comprehension` mirrors the last element of
///   `comprehension_history`, or `Initial` if empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub failed_strategies: Vec<Strategy>,
    pub comprehension_history: Vec<ComprehensionLabel>,
    pub last_comprehension: ComprehensionLabel,
    pub current_strategy: Option<Strategy>,
    pub current_instruction: Option<String>,
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            failed_strategies: Vec::new(),
            comprehension_history: Vec::new(),
            last_comprehension: ComprehensionLabel::Initial,
            current_strategy: None,
            current_instruction: None,
            attempt_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn failed_set(&self) -> HashSet<Strategy> {
        self.failed_strategies.iter().copied().collect()
    }

    /// Apply the instruction-change reset rule. A no-op when the
    /// instruction is unchanged (including the first turn, which always
    /// "changes" from `None`).
    pub fn begin_turn(&mut self, instruction: &str, now: DateTime<Utc>) {
        let changed = self.current_instruction.as_deref() != Some(instruction);
        if changed {
            self.failed_strategies.clear();
            self.comprehension_history.clear();
            self.last_comprehension = ComprehensionLabel::Initial;
            self.current_strategy = None;
            self.attempt_count = 0;
            self.current_instruction = Some(instruction.to_string());
            self.updated_at = now;
        }
    }

    /// Record the outcome of a completed turn.
    ///
    /// A strategy is added to `failed_strategies` only when comprehension is
    /// `Confused` and the strategy is a real, non-terminal one — this is the
    /// literal rule from the original `hebrew_mediation_service.py`'s
    /// `process_mediated_response`.
    pub fn record(
        &mut self,
        outcome: StrategyOutcome,
        comprehension: ComprehensionLabel,
        now: DateTime<Utc>,
    ) {
        self.comprehension_history.push(comprehension);
        self.last_comprehension = comprehension;
        if let StrategyOutcome::Strategy(strategy) = outcome {
            self.current_strategy = Some(strategy);
            if comprehension == ComprehensionLabel::Confused
                && strategy.is_real()
                && !self.failed_strategies.contains(&strategy)
            {
                self.failed_strategies.push(strategy);
            }
        }
        self.attempt_count += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn begin_turn_resets_on_instruction_change() {
        let mut state = ConversationState::new("s1");
        let t0 = Utc::now();
        state.begin_turn("add 2+2", t0);
        state.record(
            StrategyOutcome::Strategy(Strategy::EmotionalSupport),
            ComprehensionLabel::Confused,
            t0,
        );
        assert_eq!(state.failed_strategies.len(), 1);
        assert_eq!(state.attempt_count, 1);

        state.begin_turn("add 2+2", t0);
        assert_eq!(
            state.failed_strategies.len(),
            1,
            "same instruction must not reset"
        );

        state.begin_turn("subtract 5-1", t0);
        assert!(state.failed_strategies.is_empty());
        assert_eq!(state.attempt_count, 0);
        assert_eq!(state.current_instruction.as_deref(), Some("subtract 5-1"));
    }

    #[test]
    fn record_only_fails_real_strategies_on_confusion() {
        let mut state = ConversationState::new("s2");
        let t0 = Utc::now();
        state.begin_turn("x", t0);
        state.record(
            StrategyOutcome::Strategy(Strategy::TeacherEscalation),
            ComprehensionLabel::Confused,
            t0,
        );
        assert!(
            state.failed_strategies.is_empty(),
            "terminal strategy must never enter failed_strategies (I1)"
        );

        state.record(
            StrategyOutcome::Strategy(Strategy::GuidedReading),
            ComprehensionLabel::Understood,
            t0,
        );
        assert!(
            !state.failed_strategies.contains(&Strategy::GuidedReading),
            "understood outcomes must not mark a strategy failed"
        );
    }

    #[test]
    fn attempt_count_matches_history_length() {
        let mut state = ConversationState::new("s3");
        let t0 = Utc::now();
        state.begin_turn("x", t0);
        for _ in 0..4 {
            state.record(
                StrategyOutcome::Strategy(Strategy::HighlightKeywords),
                ComprehensionLabel::Partial,
                t0,
            );
        }
        assert_eq!(state.attempt_count as usize, state.comprehension_history.len());
    }

    #[test]
    fn last_comprehension_mirrors_history_tail() {
        let mut state = ConversationState::new("s4");
        let t0 = Utc::now();
        state.begin_turn("x", t0);
        assert_eq!(state.last_comprehension, ComprehensionLabel::Initial);
        state.record(
            StrategyOutcome::Strategy(Strategy::GuidedReading),
            ComprehensionLabel::Understood,
            t0,
        );
        assert_eq!(state.last_comprehension, ComprehensionLabel::Understood);
    }
}
