//! Comprehension classification (C2).
//!
//! A strictly ordered, total, pure function. Order is part of the
//! contract and phrase sets are carried verbatim from
//! `hebrew_mediation_chain.py`'s `assess_comprehension`.

use mediation_core::ComprehensionLabel;

const GREETINGS: &[&str] = &["היי", "שלום", "הי", "שלום שלום"];

const EMOTIONAL_PHRASES: &[&str] = &[
    "אני עצוב", "אני עצובה", "עצוב", "עצובה", "עצובים", "עצובות", "עצוב לי", "בוכה", "בוכים", "אני בוכה",
    "אני כועס", "אני כועסת", "כועס", "כועסת", "כועסים", "כועסות", "כועס על", "נרגז", "נרגזת", "מעצבן", "אני נרגז",
    "אני מפחד", "אני מפחדת", "מפחד", "מפחדת", "מפחדים", "מפחדות", "פחד", "מפחיד", "מפחידה",
    "אני חרד", "אני חרדה", "חרד", "חרדה", "חרדים", "חרדות", "מלחיץ", "מלחיצה", "לחוץ", "אני לחוץ",
    "אני דואג", "אני דואגת", "דואג", "דואגת", "דואגים", "דואגות", "מודאג", "מודאגת", "דאגה",
    "אני מתוסכל", "אני מתוסכלת", "מתוסכל", "מתוסכלת", "תסכול", "נמאס לי", "נמאס", "מעצבן",
    "לא רוצה", "לא בא לי", "לא מתחשק לי", "מוותר", "לא יכול יותר", "אני לא רוצה", "אני מוותר",
    "לא טוב לי", "רע לי", "לא בסדר", "לא טוב", "רע", "גרוע", "נורא", "זוועה", "אני לא מרגיש טוב",
];

const CONFUSION_PHRASES: &[&str] = &[
    "לא הבין", "לא מבין", "מה זה אומר", "לא מצליח", "קשה לי",
    "לא יודע", "אל תבין", "מה זה", "איך עושים", "עזרה",
    "לא מבין כלום", "זה יותר מדי קשה", "לא מצליח בכלל", "מה קורה פה",
    "זה לא הגיוני", "לא מבין בכלל", "מה זה הדבר הזה", "איך זה עובד",
    "confused", "confusing", "hard", "difficult", "don't understand",
    "?", "שאלה", "question", "תעזור", "תעזרי", "איך", "למה", "מתי", "איפה", "מי", "מה", "איזה",
    "help", "what is", "how", "why", "when", "where", "who", "what", "which",
];

const UNDERSTANDING_PHRASES: &[&str] = &["הבנתי", "ברור", "יודע", "מבין", "אוקיי", "בסדר", "נכון", "כן"];

/// Pure, total, deterministic. No I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComprehensionClassifier;

impl ComprehensionClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, utterance: &str) -> ComprehensionLabel {
        let normalized = normalize(utterance);

        if normalized.is_empty() || GREETINGS.contains(&normalized.as_str()) {
            return ComprehensionLabel::Initial;
        }

        if EMOTIONAL_PHRASES.iter().any(|phrase| normalized.contains(phrase)) {
            return ComprehensionLabel::Emotional;
        }

        if CONFUSION_PHRASES.iter().any(|phrase| normalized.contains(phrase)) {
            return ComprehensionLabel::Confused;
        }

        if UNDERSTANDING_PHRASES.iter().any(|phrase| normalized.contains(phrase)) {
            return ComprehensionLabel::Understood;
        }

        if normalized.split_whitespace().count() > 1 {
            return ComprehensionLabel::Confused;
        }

        ComprehensionLabel::Partial
    }
}

fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_deterministic() {
        let classifier = ComprehensionClassifier::new();
        assert_eq!(classifier.classify("לא הבנתי"), classifier.classify("לא הבנתי"));
    }

    #[test]
    fn empty_and_greeting_are_initial() {
        let classifier = ComprehensionClassifier::new();
        assert_eq!(classifier.classify(""), ComprehensionLabel::Initial);
        assert_eq!(classifier.classify("שלום"), ComprehensionLabel::Initial);
        assert_eq!(classifier.classify("  הי  "), ComprehensionLabel::Initial);
    }

    #[test]
    fn emotional_precedes_confusion() {
        let classifier = ComprehensionClassifier::new();
        // "אני עצוב" contains no confusion-set phrase, so this just pins the
        // emotional branch; the precedence itself is pinned by the
        // router-level test in `router.rs`.
        assert_eq!(classifier.classify("אני עצוב"), ComprehensionLabel::Emotional);
    }

    #[test]
    fn question_mark_triggers_confused() {
        let classifier = ComprehensionClassifier::new();
        assert_eq!(classifier.classify("מה זה?"), ComprehensionLabel::Confused);
    }

    #[test]
    fn understanding_phrase_is_recognized() {
        let classifier = ComprehensionClassifier::new();
        assert_eq!(classifier.classify("הבנתי תודה"), ComprehensionLabel::Understood);
    }

    #[test]
    fn multi_token_miss_falls_back_to_confused() {
        let classifier = ComprehensionClassifier::new();
        assert_eq!(classifier.classify("זה נחמד מאוד"), ComprehensionLabel::Confused);
    }

    #[test]
    fn single_unmatched_token_is_partial() {
        let classifier = ComprehensionClassifier::new();
        assert_eq!(classifier.classify("אולי"), ComprehensionLabel::Partial);
    }
}
