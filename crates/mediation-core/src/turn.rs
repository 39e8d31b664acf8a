//! Turn-level request/response shapes (C7 ingress/egress).

use serde::{Deserialize, Serialize};

use crate::strategy::{AssistanceType, ComprehensionLabel, Mode, StrategyOutcome};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTurnRequest {
    pub session_id: String,
    pub instruction: String,
    pub utterance: String,
    pub mode: Mode,
    pub assistance_type: Option<AssistanceType>,
    pub preferred_provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTurnRequest {
    pub session_id: String,
    pub images: Vec<Vec<u8>>,
    pub caption: Option<String>,
    pub mode: Mode,
    pub preferred_provider: Option<String>,
}

/// How an image turn was ultimately satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageIngestMethod {
    Vision,
    Ocr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub response_text: String,
    pub strategy_used: StrategyOutcome,
    pub comprehension_level: ComprehensionLabel,
    pub attempt_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTurnResult {
    #[serde(flatten)]
    pub turn: TurnResult,
    pub image_refs: Vec<String>,
    pub method: ImageIngestMethod,
}
