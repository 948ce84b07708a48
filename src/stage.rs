//! The three classifier stages of the cascade.
//!
//! Crisis and flow stages may decline a message (`StageOutcome::PassThrough`);
//! the empathy stage cannot, so it returns a `Verdict` directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::predictor::Predictor;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Crisis,
    Flow,
    Empathy,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Crisis => "crisis",
            StageId::Flow => "flow",
            StageId::Empathy => "empathy",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one stage decided about a message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub stage: StageId,
    pub label: String,
    /// Supporting label, e.g. the crisis gate's raw output.
    pub secondary: Option<String>,
}

impl Verdict {
    pub fn new(stage: StageId, label: impl Into<String>) -> Self {
        Self {
            stage,
            label: label.into(),
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage claims the turn.
    Terminal(Verdict),
    /// The stage does not apply; evaluation moves on.
    PassThrough,
}

/// Binary crisis gate followed by a crisis-type classifier.
#[derive(Clone)]
pub struct CrisisStage {
    detector: Arc<dyn Predictor>,
    classifier: Arc<dyn Predictor>,
    positive_label: String,
}

impl CrisisStage {
    pub fn new(
        detector: Arc<dyn Predictor>,
        classifier: Arc<dyn Predictor>,
        positive_label: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            classifier,
            positive_label: positive_label.into(),
        }
    }

    fn is_positive(&self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(&self.positive_label)
    }

    pub fn evaluate(&self, text: &str) -> StageOutcome {
        let gate = match self.detector.predict(text) {
            Ok(label) => label,
            Err(e) => {
                log::warn!(
                    "Crisis detector '{}' failed, treating as no crisis: {}",
                    self.detector.name(),
                    e
                );
                return StageOutcome::PassThrough;
            }
        };
        if !self.is_positive(&gate) {
            return StageOutcome::PassThrough;
        }

        // Once the gate fires the turn belongs to this stage, even if the
        // type classifier cannot name the crisis.
        let crisis_type = match self.classifier.predict(text) {
            Ok(label) => label,
            Err(e) => {
                log::warn!(
                    "Crisis classifier '{}' failed, using crisis default: {}",
                    self.classifier.name(),
                    e
                );
                String::new()
            }
        };
        StageOutcome::Terminal(Verdict::new(StageId::Crisis, crisis_type).with_secondary(gate))
    }
}

/// Conversation-phase classifier with a reserved "does not apply" label.
#[derive(Clone)]
pub struct FlowStage {
    model: Arc<dyn Predictor>,
    unknown_label: String,
}

impl FlowStage {
    pub fn new(model: Arc<dyn Predictor>, unknown_label: impl Into<String>) -> Self {
        Self {
            model,
            unknown_label: unknown_label.into(),
        }
    }

    /// Blank labels and the unknown label (trimmed, any case) pass through.
    fn is_unknown(&self, label: &str) -> bool {
        let label = label.trim();
        label.is_empty() || label.eq_ignore_ascii_case(&self.unknown_label)
    }

    pub fn evaluate(&self, text: &str) -> StageOutcome {
        match self.model.predict(text) {
            Ok(label) if self.is_unknown(&label) => StageOutcome::PassThrough,
            Ok(label) => StageOutcome::Terminal(Verdict::new(StageId::Flow, label)),
            Err(e) => {
                log::warn!(
                    "Flow model '{}' failed, treating as unknown: {}",
                    self.model.name(),
                    e
                );
                StageOutcome::PassThrough
            }
        }
    }
}

/// Emotion classifier; the last stage, so it always answers.
#[derive(Clone)]
pub struct EmpathyStage {
    model: Arc<dyn Predictor>,
}

impl EmpathyStage {
    pub fn new(model: Arc<dyn Predictor>) -> Self {
        Self { model }
    }

    pub fn evaluate(&self, text: &str) -> Verdict {
        let label = self.model.predict(text).unwrap_or_else(|e| {
            log::warn!(
                "Empathy model '{}' failed, using empathy default: {}",
                self.model.name(),
                e
            );
            String::new()
        });
        Verdict::new(StageId::Empathy, label)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::PredictError;

    /// Predictor that always answers with the same label, or always fails.
    pub(crate) struct FixedPredictor(pub Option<&'static str>);

    impl Predictor for FixedPredictor {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _text: &str) -> Result<String, PredictError> {
            self.0
                .map(str::to_string)
                .ok_or(PredictError::NoClasses)
        }
    }

    pub(crate) fn fixed(label: &'static str) -> Arc<dyn Predictor> {
        Arc::new(FixedPredictor(Some(label)))
    }

    pub(crate) fn failing() -> Arc<dyn Predictor> {
        Arc::new(FixedPredictor(None))
    }

    #[test]
    fn crisis_gate_negative_passes_through() {
        let stage = CrisisStage::new(fixed("false"), fixed("self_harm"), "true");
        assert_eq!(stage.evaluate("anything"), StageOutcome::PassThrough);
    }

    #[test]
    fn crisis_gate_positive_is_terminal_with_type() {
        let stage = CrisisStage::new(fixed("True"), fixed("panic_attack"), "true");
        let expected = Verdict::new(StageId::Crisis, "panic_attack").with_secondary("True");
        assert_eq!(stage.evaluate("anything"), StageOutcome::Terminal(expected));
    }

    #[test]
    fn crisis_classifier_failure_still_terminal() {
        let stage = CrisisStage::new(fixed("true"), failing(), "true");
        match stage.evaluate("anything") {
            StageOutcome::Terminal(v) => {
                assert_eq!(v.stage, StageId::Crisis);
                assert_eq!(v.label, "");
            }
            StageOutcome::PassThrough => panic!("crisis gate fired but stage passed"),
        }
    }

    #[test]
    fn crisis_detector_failure_passes_through() {
        let stage = CrisisStage::new(failing(), fixed("self_harm"), "true");
        assert_eq!(stage.evaluate("anything"), StageOutcome::PassThrough);
    }

    #[test]
    fn flow_unknown_passes_through() {
        let stage = FlowStage::new(fixed("unknown"), "unknown");
        assert_eq!(stage.evaluate("weather"), StageOutcome::PassThrough);
        let stage = FlowStage::new(fixed(" "), "unknown");
        assert_eq!(stage.evaluate("weather"), StageOutcome::PassThrough);
    }

    #[test]
    fn flow_unknown_label_ignores_case_and_whitespace() {
        for label in ["Unknown", "UNKNOWN", "unknown\n", "  unknown "] {
            let stage = FlowStage::new(fixed(label), "unknown");
            assert_eq!(
                stage.evaluate("weather"),
                StageOutcome::PassThrough,
                "for {:?}",
                label
            );
        }
    }

    #[test]
    fn flow_known_label_is_terminal() {
        let stage = FlowStage::new(fixed("closure"), "unknown");
        assert_eq!(
            stage.evaluate("thank you"),
            StageOutcome::Terminal(Verdict::new(StageId::Flow, "closure"))
        );
    }

    #[test]
    fn empathy_failure_yields_blank_label() {
        let stage = EmpathyStage::new(failing());
        assert_eq!(stage.evaluate("x"), Verdict::new(StageId::Empathy, ""));
    }
}
