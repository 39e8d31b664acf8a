//! Tesseract-backed `OcrService`: two-config attempts under a per-attempt
//! timeout.
//!
//! Mirrors the original source's `extract_text` behaviour: two PSM passes
//! (`--psm 6` uniform block, `--psm 7` single line), `heb+eng` language
//! data, 30s timeout per pass, first pass producing more than ten
//! characters short-circuits the second. `leptess` (Tesseract/Leptonica
//! bindings) is the closest real equivalent to the source's `pytesseract`
//! dependency.

use async_trait::async_trait;
use mediation_core::{OcrError, OcrService};

const PSM_CONFIGS: [&str; 2] = ["6", "7"];
const LANGUAGE: &str = "heb+eng";
const PER_ATTEMPT_TIMEOUT_SECS: u64 = 30;
const GOOD_ENOUGH_LEN: usize = 10;
const MIN_USABLE_LEN: usize = 2;

pub struct TesseractOcrService {
    tessdata_path: Option<String>,
}

impl TesseractOcrService {
    pub fn new() -> Self {
        Self { tessdata_path: None }
    }

    /// Points Leptonica/Tesseract at a non-standard `tessdata` directory,
    /// mirroring the source's per-platform `tesseract_cmd` configuration.
    pub fn with_tessdata_path(path: impl Into<String>) -> Self {
        Self { tessdata_path: Some(path.into()) }
    }

    fn run_pass(tessdata_path: Option<&str>, image: &[u8], psm: &str) -> Option<String> {
        use leptess::{LepTess, Variable};

        let mut engine = LepTess::new(tessdata_path, LANGUAGE).ok()?;
        engine.set_variable(Variable::TesseditPageSegMode, psm).ok()?;
        engine.set_image_from_mem(image).ok()?;
        engine.get_utf8_text().ok()
    }
}

impl Default for TesseractOcrService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrService for TesseractOcrService {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        if image.is_empty() {
            return Err(OcrError::BackendUnavailable);
        }

        let mut best = String::new();

        for psm in PSM_CONFIGS {
            let image = image.to_vec();
            let tessdata_path = self.tessdata_path.clone();

            let attempt = tokio::time::timeout(
                std::time::Duration::from_secs(PER_ATTEMPT_TIMEOUT_SECS),
                tokio::task::spawn_blocking(move || {
                    Self::run_pass(tessdata_path.as_deref(), &image, psm)
                }),
            )
            .await;

            let extracted = match attempt {
                Ok(Ok(Some(text))) => text.trim().to_string(),
                Ok(Ok(None)) => continue,
                Ok(Err(_)) => continue,
                Err(_) => {
                    tracing::warn!(psm, "OCR pass timed out after 30s");
                    continue;
                }
            };

            if extracted.len() > best.len() {
                best = extracted;
            }
            if best.len() > GOOD_ENOUGH_LEN {
                break;
            }
        }

        if best.trim().len() > MIN_USABLE_LEN {
            Ok(best.split_whitespace().collect::<Vec<_>>().join(" "))
        } else {
            Err(OcrError::NoTextRecovered)
        }
    }
}
