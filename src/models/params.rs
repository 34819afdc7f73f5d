use garde::Validate;
use serde::{Deserialize, Serialize};

/// Redaction parameters submitted with a job and echoed back verbatim by
/// the backend.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[garde(allow_unvalidated)]
pub struct BlurParams {
    /// Gaussian kernel size. The backend requires an odd value.
    #[garde(custom(is_odd))]
    pub blur_strength: u32,

    /// Detection confidence threshold.
    #[garde(range(min = 0.0, max = 1.0))]
    pub confidence: f64,

    /// Analyze every Nth frame.
    #[garde(range(min = 1))]
    pub sample_rate: u32,

    /// Extra pixels blurred around each detection.
    pub padding: u32,

    /// Languages passed to the backend's text detector.
    #[garde(length(min = 1))]
    pub languages: Vec<String>,

    /// Words redacted regardless of detection confidence.
    pub words: Vec<String>,
}

fn is_odd(value: &u32, _ctx: &()) -> garde::Result {
    if value % 2 == 0 {
        return Err(garde::Error::new("blur_strength must be an odd number"));
    }
    Ok(())
}

impl Default for BlurParams {
    fn default() -> Self {
        // Backend defaults.
        Self {
            blur_strength: 51,
            confidence: 0.5,
            sample_rate: 1,
            padding: 10,
            languages: vec!["en".to_string()],
            words: Vec::new(),
        }
    }
}

impl BlurParams {
    /// Blur strength as shown in a form: even input is nudged up by one.
    /// Display only; the server remains the authority on validity.
    pub fn display_blur_strength(&self) -> u32 {
        if self.blur_strength % 2 == 0 {
            self.blur_strength + 1
        } else {
            self.blur_strength
        }
    }

    /// Confidence threshold formatted to one decimal for display.
    pub fn display_confidence(&self) -> String {
        format!("{:.1}", self.confidence)
    }
}
