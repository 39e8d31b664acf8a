//! Deterministic Hebrew prompt rendering (C1).
//!
//! Templates, fallback strings, the greeting, the escalation message, the
//! direct emotional response table and the concept-keyword map are carried
//! verbatim from `hebrew_mediation_chain.py`.

use std::collections::HashMap;

use mediation_core::{Strategy, TemplateError};

const GREETING: &str =
    "היי, אני לרנובוט, ואני פה כדי לעזור לך להבין את המשימות שלך. מה שלומך? 😊";

const ESCALATION: &str = "נראה לי שהמשימה הזו מורכבת. בוא נפנה למורה שלך לעזרה נוספת. אתה יכול ללחוץ על כפתור 'קריאה למורה' 👩‍🏫";

const DIRECT_EMOTIONAL_RESPONSES: &[(&str, &str)] = &[
    ("אני עצוב", "אני מבין שאתה מרגיש עצוב. זה בסדר להרגיש כך. אני כאן בשבילך. איך אני יכול לעזור לך להרגיש יותר טוב? 💙"),
    ("אני עצובה", "אני מבינה שאת מרגישה עצובה. זה בסדר להרגיש כך. אני כאן בשבילך. איך אני יכול לעזור לך להרגיש יותר טובה? 💙"),
    ("עצוב", "אני מבין שאתה מרגיש עצוב. זה בסדר להרגיש כך. אני כאן בשבילך. איך אני יכול לעזור לך להרגיש יותר טוב? 💙"),
    ("עצובה", "אני מבינה שאת מרגישה עצובה. זה בסדר להרגיש כך. אני כאן בשבילך. איך אני יכול לעזור לך להרגיש יותר טובה? 💙"),
    ("אני כועס", "אני רואה שאתה כועס. זה בסדר להרגיש כך. בוא נדבר על מה שמפריע לך. אני כאן להקשיב. 💪"),
    ("אני כועסת", "אני רואה שאת כועסת. זה בסדר להרגיש כך. בואי נדבר על מה שמפריע לך. אני כאן להקשיב. 💪"),
    ("כועס", "אני רואה שאתה כועס. זה בסדר להרגיש כך. בוא נדבר על מה שמפריע לך. אני כאן להקשיב. 💪"),
    ("כועסת", "אני רואה שאת כועסת. זה בסדר להרגיש כך. בואי נדבר על מה שמפריע לך. אני כאן להקשיב. 💪"),
    ("אני מפחד", "אני מבין שאתה מפחד. זה בסדר לפחד. אני כאן כדי לעזור לך להרגיש בטוח יותר. איך אני יכול לתמוך בך? 🤗"),
    ("אני מפחדת", "אני מבינה שאת מפחדת. זה בסדר לפחד. אני כאן כדי לעזור לך להרגיש בטוחה יותר. איך אני יכול לתמוך בך? 🤗"),
    ("מפחד", "אני מבין שאתה מפחד. זה בסדר לפחד. אני כאן כדי לעזור לך להרגיש בטוח יותר. איך אני יכול לתמוך בך? 🤗"),
    ("מפחדת", "אני מבינה שאת מפחדת. זה בסדר לפחד. אני כאן כדי לעזור לך להרגיש בטוחה יותר. איך אני יכול לתמוך בך? 🤗"),
    ("אני דואג", "אני רואה שאתה דואג. זה טבעי לדאוג לפעמים. אני כאן כדי לעזור לך. בוא נדבר על מה שמדאיג אותך. 💙"),
    ("אני דואגת", "אני רואה שאת דואגת. זה טבעי לדאוג לפעמים. אני כאן כדי לעזור לך. בואי נדבר על מה שמדאיג אותך. 💙"),
    ("דואג", "אני רואה שאתה דואג. זה טבעי לדאוג לפעמים. אני כאן כדי לעזור לך. בוא נדבר על מה שמדאיג אותך. 💙"),
    ("דואגת", "אני רואה שאת דואגת. זה טבעי לדאוג לפעמים. אני כאן כדי לעזור לך. בואי נדבר על מה שמדאיג אותך. 💙"),
    ("לא רוצה", "אני מבין שאתה לא רוצה לעשות את זה עכשיו. זה בסדר. אולי נוכל לנסות משהו אחר או לחזור לזה מאוחר יותר? 😊"),
    ("אני לא רוצה", "אני מבין שאתה לא רוצה לעשות את זה עכשיו. זה בסדר. אולי נוכל לנסות משהו אחר או לחזור לזה מאוחר יותר? 😊"),
    ("לא בא לי", "אני מבין שאתה לא מרגיש מוכן לזה עכשיו. זה בסדר. איך אני יכול לעזור לך להרגיש יותר מוכן? 🌟"),
    ("לא טוב לי", "אני מבין שאתה לא מרגיש טוב. זה בסדר. אני כאן כדי לעזור לך. איך אני יכול לתמוך בך? 💙"),
    ("רע לי", "אני מבין שאתה מרגיש רע. זה בסדר להרגיש כך. אני כאן בשבילך. איך אני יכול לעזור לך להרגיש יותר טוב? 💙"),
    ("אני לא מרגיש טוב", "אני מבין שאתה לא מרגיש טוב. זה בסדר. אני כאן כדי לעזור לך. איך אני יכול לתמוך בך? 💙"),
];

const CONCEPT_KEYWORDS: &[(&str, &str)] = &[
    ("חישוב", "חשבון במתמטיקה"),
    ("קריאה", "קריאת טקסט"),
    ("כתיבה", "כתיבת משפטים"),
    ("ציור", "ציור או רישום"),
    ("השוואה", "השוואה בין דברים"),
    ("מיון", "סידור לפי קטגוריות"),
    ("הסבר", "הסבר של רעיון"),
];

const DEFAULT_CONCEPT: &str = "משימה כללית";

fn template_for(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::EmotionalSupport => "התלמיד אמר: {instruction}\n\nתגיב בעברית בחמימות ותמיכה. תגיב לרגש של התלמיד, לא למשימה.\nהשתמש במילים כמו: \"אני כאן בשבילך\", \"אני מבין\", \"בוא ננסה יחד\", \"אל תדאג\", \"אני אעזור לך\".\nתגיב בשפה חמה ומעודדת, 1-2 משפטים קצרים.\nהתאם את התגובה למה שהתלמיד אמר - אם התלמיד עצוב, תגיב בהבנה. אם התלמיד כועס, תגיב בסבלנות.\nהשתמש בשפה ניטרלית או התאם למין שהתלמיד הזכיר.\n\nתגובה:",
        Strategy::HighlightKeywords => "בוא נסתכל על המילים החשובות בהוראה: {instruction}\n\nזהה 2-3 מילות מפתח חשובות בהוראה.\nהסבר מה כל מילה אומרת במילים פשוטות.\nהשתמש במילים כמו: \"המילה החשובה היא\", \"זה אומר\", \"הכוונה היא\".\nהשתמש בשפה ניטרלית או התאם למין שהתלמיד הזכיר.\n\nתגובה:",
        Strategy::GuidedReading => "בוא נקרא את ההוראה יחד: {instruction}\n\nקרא את ההוראה מילה אחר מילה.\nשאל את התלמיד מה התלמיד חושב שמבקשים לעשות.\nהשתמש במילים כמו: \"בוא נקרא יחד\", \"מה אתה/את חושב/ת\", \"מה מבקשים\".\nהשתמש בשפה ניטרלית או התאם למין שהתלמיד הזכיר.\n\nתגובה:",
        Strategy::ProvideExample => "הנה דוגמה פשוטה להבנת ההוראה: {instruction}\n\nתן דוגמה קונקרטית מהחיים שמסבירה את ההוראה.\nהשתמש במילים כמו: \"לדוגמה\", \"זה כמו\", \"תחשוב על זה כך\".\nהדוגמה צריכה להיות פשוטה ורלוונטית לתלמיד.\nהשתמש בשפה ניטרלית או התאם למין שהתלמיד הזכיר.\n\nתגובה:",
        Strategy::BreakdownSteps => "בוא נפרק את ההוראה לשלבים פשוטים: {instruction}\n\nפרק את ההוראה ל-3-4 שלבים פשוטים וברורים.\nכל שלב צריך להיות קצר וקל להבנה.\nהשתמש במילים כמו: \"שלב ראשון\", \"אחר כך\", \"בסוף\".\nהשתמש בשפה ניטרלית או התאם למין שהתלמיד הזכיר.\n\nתגובה:",
        Strategy::DetailedExplanation => "בוא נבין יחד מה ההוראה אומרת: {instruction}\n\nהסבר את ההוראה במילים פשוטות וברורות.\nכלול: מה צריך לעשות, איך לעשות את זה, איך לדעת שסיימת.\nהשתמש במילים כמו: \"המטרה היא\", \"איך עושים את זה\", \"כשתסיים\".\nהשתמש בשפה ניטרלית או התאם למין שהתלמיד הזכיר.\n\nתגובה:",
        Strategy::TeacherEscalation => ESCALATION,
    }
}

fn fallback_text(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::EmotionalSupport => "אני מבין שאתה מרגיש עצוב. זה בסדר להרגיש כך. אני כאן בשבילך. איך אני יכול לעזור לך להרגיש יותר טוב? 💙",
        Strategy::HighlightKeywords => "בוא נסתכל על המילים החשובות בהוראה. איזו מילה נראית לך הכי חשובה?",
        Strategy::GuidedReading => "בוא נקרא שוב את ההוראה בזהירות, מילה אחר מילה.",
        Strategy::ProvideExample => "אני אתן לך דוגמה שתעזור להבין את המשימה.",
        Strategy::BreakdownSteps => "בוא נפרק את המשימה לחלקים קטנים וקלים.",
        Strategy::DetailedExplanation => "אני אסביר לך במילים פשוטות מה צריך לעשות.",
        Strategy::TeacherEscalation => ESCALATION,
    }
}

/// Bounded set of template variables `render` accepts.
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    pub instruction: String,
    pub concept: Option<String>,
}

/// Immutable, thread-safe collection of Hebrew prompt text. No I/O, no
/// randomness, safe to share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog;

impl PromptCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        strategy: Strategy,
        variables: &TemplateVariables,
        system_prefix: Option<&str>,
    ) -> Result<String, TemplateError> {
        let mut rendered = template_for(strategy).replace("{instruction}", &variables.instruction);

        if rendered.contains("{concept}") {
            let concept = variables
                .concept
                .as_deref()
                .ok_or_else(|| TemplateError::MissingVariable("concept".to_string()))?;
            rendered = rendered.replace("{concept}", concept);
        }

        if let Some(prefix) = system_prefix {
            rendered = format!("{prefix}\n\n{rendered}");
        }

        Ok(rendered)
    }

    pub fn fallback_for(&self, strategy: Strategy) -> &'static str {
        fallback_text(strategy)
    }

    pub fn greeting(&self) -> &'static str {
        GREETING
    }

    pub fn escalation(&self) -> &'static str {
        ESCALATION
    }

    /// Bypasses model generation for emotional support when the normalized
    /// utterance matches a known phrase.
    pub fn direct_emotional_response(&self, utterance: &str) -> Option<&'static str> {
        let normalized = utterance.to_lowercase();
        DIRECT_EMOTIONAL_RESPONSES
            .iter()
            .find(|(phrase, _)| normalized.contains(phrase))
            .map(|(_, response)| *response)
    }

    pub fn concept_for(&self, instruction: &str) -> &'static str {
        let normalized = instruction.to_lowercase();
        CONCEPT_KEYWORDS
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword))
            .map(|(_, concept)| *concept)
            .unwrap_or(DEFAULT_CONCEPT)
    }
}

/// Builds the `{strategy: fallback}` table a caller may want to inspect as a
/// whole (e.g. for admin tooling); derived from `fallback_text`.
pub fn fallback_table() -> HashMap<Strategy, &'static str> {
    Strategy::HIERARCHY
        .iter()
        .copied()
        .map(|s| (s, fallback_text(s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_contains_bot_name() {
        assert!(PromptCatalog::new().greeting().contains("לרנובוט"));
    }

    #[test]
    fn escalation_contains_call_teacher() {
        assert!(PromptCatalog::new().escalation().contains("קריאה למורה"));
    }

    #[test]
    fn render_substitutes_instruction() {
        let catalog = PromptCatalog::new();
        let vars = TemplateVariables {
            instruction: "פתור 25+37".to_string(),
            concept: None,
        };
        let rendered = catalog
            .render(Strategy::GuidedReading, &vars, None)
            .unwrap();
        assert!(rendered.contains("פתור 25+37"));
    }

    #[test]
    fn render_example_requires_concept() {
        let catalog = PromptCatalog::new();
        let vars = TemplateVariables {
            instruction: "חישוב".to_string(),
            concept: None,
        };
        let result = catalog.render(Strategy::ProvideExample, &vars, None);
        assert!(result.is_ok(), "example template has no {{concept}} placeholder in the source text");
    }

    #[test]
    fn direct_emotional_response_matches_substring() {
        let catalog = PromptCatalog::new();
        assert!(catalog.direct_emotional_response("אני עצוב מאוד").is_some());
        assert!(catalog.direct_emotional_response("הכל טוב").is_none());
    }

    #[test]
    fn concept_for_defaults_to_general_task() {
        let catalog = PromptCatalog::new();
        assert_eq!(catalog.concept_for("חישוב של מספרים"), "חשבון במתמטיקה");
        assert_eq!(catalog.concept_for("תרגיל ללא מילת מפתח"), DEFAULT_CONCEPT);
    }
}
