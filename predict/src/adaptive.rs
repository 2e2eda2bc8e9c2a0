/// Tracks recent keystroke-to-confirmation latency to decide whether
/// `PredictionMode::Adaptive` should currently render predictions (§4.6).
/// A glitch counter rises on slow or wrong confirmations and decays on
/// fast, correct ones; predictions show while it's above zero.
pub struct AdaptiveActivation {
    threshold_ms: f64,
    glitch_count: u32,
}

const DEFAULT_THRESHOLD_MS: f64 = 40.0;
const MAX_GLITCH_COUNT: u32 = 5;

impl AdaptiveActivation {
    pub fn new() -> Self {
        AdaptiveActivation { threshold_ms: DEFAULT_THRESHOLD_MS, glitch_count: 0 }
    }

    pub fn with_threshold(threshold_ms: f64) -> Self {
        AdaptiveActivation { threshold_ms, glitch_count: 0 }
    }

    /// Record the outcome of one prediction's reconciliation: how long it
    /// took to confirm (or expire/prove wrong), and whether it was correct.
    pub fn record_outcome(&mut self, confirm_latency_ms: f64, correct: bool) {
        if correct && confirm_latency_ms < self.threshold_ms {
            self.glitch_count = self.glitch_count.saturating_sub(1);
        } else {
            self.glitch_count = (self.glitch_count + 1).min(MAX_GLITCH_COUNT);
        }
    }

    pub fn is_active(&self) -> bool {
        self.glitch_count > 0
    }
}

impl Default for AdaptiveActivation {
    fn default() -> Self {
        AdaptiveActivation::new()
    }
}
