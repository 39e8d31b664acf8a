//! Strategy routing (C3).
//!
//! Pure, total, cannot fail. Ported rule-for-rule from
//! `HebrewMediationRouter.route_strategy`.

use std::collections::HashSet;

use mediation_core::{AssistanceType, ComprehensionLabel, Mode, Strategy};

#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyRouter;

impl StrategyRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(
        &self,
        comprehension: ComprehensionLabel,
        failed: &HashSet<Strategy>,
        mode: Mode,
        assistance_type: Option<AssistanceType>,
    ) -> Strategy {
        // Emotional first-aid must never be suppressed by an explicit
        // assistance_type override, even though the original source checks
        // assistance_type first — emotional precedence is intentional here.
        if comprehension == ComprehensionLabel::Emotional {
            return Strategy::EmotionalSupport;
        }

        if let Some(assistance) = assistance_type {
            return assistance.target_strategy();
        }

        if mode == Mode::Test && failed.len() >= Mode::TEST_MODE_CEILING {
            return Strategy::TeacherEscalation;
        }

        for strategy in Strategy::HIERARCHY {
            if !failed.contains(&strategy) {
                return strategy;
            }
        }

        Strategy::TeacherEscalation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotional_short_circuits_even_with_assistance_type() {
        let router = StrategyRouter::new();
        let failed = HashSet::new();
        let strategy = router.route(
            ComprehensionLabel::Emotional,
            &failed,
            Mode::Practice,
            Some(AssistanceType::Breakdown),
        );
        assert_eq!(strategy, Strategy::EmotionalSupport);
    }

    #[test]
    fn assistance_override_maps_to_fixed_table() {
        let router = StrategyRouter::new();
        let failed = HashSet::new();
        assert_eq!(
            router.route(ComprehensionLabel::Confused, &failed, Mode::Practice, Some(AssistanceType::Explain)),
            Strategy::DetailedExplanation
        );
        assert_eq!(
            router.route(ComprehensionLabel::Confused, &failed, Mode::Practice, Some(AssistanceType::Breakdown)),
            Strategy::BreakdownSteps
        );
        assert_eq!(
            router.route(ComprehensionLabel::Confused, &failed, Mode::Practice, Some(AssistanceType::Example)),
            Strategy::ProvideExample
        );
    }

    #[test]
    fn test_mode_ceiling_escalates_at_three_failures() {
        let router = StrategyRouter::new();
        let mut failed = HashSet::new();
        failed.insert(Strategy::EmotionalSupport);
        failed.insert(Strategy::HighlightKeywords);
        failed.insert(Strategy::GuidedReading);
        assert_eq!(
            router.route(ComprehensionLabel::Confused, &failed, Mode::Test, None),
            Strategy::TeacherEscalation
        );
    }

    #[test]
    fn hierarchy_scan_returns_first_unused_real_strategy() {
        // Empty failed set, confused comprehension -> the hierarchy scan
        // still lands on emotional_support first, per the literal source
        // behaviour (see DESIGN.md's open-question resolutions).
        let router = StrategyRouter::new();
        let failed = HashSet::new();
        assert_eq!(
            router.route(ComprehensionLabel::Confused, &failed, Mode::Practice, None),
            Strategy::EmotionalSupport
        );
    }

    #[test]
    fn all_strategies_failed_escalates() {
        let router = StrategyRouter::new();
        let failed: HashSet<Strategy> = Strategy::HIERARCHY.iter().copied().collect();
        assert_eq!(
            router.route(ComprehensionLabel::Confused, &failed, Mode::Practice, None),
            Strategy::TeacherEscalation
        );
    }
}
