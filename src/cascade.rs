use serde::Serialize;

use crate::model::LoadedModels;
use crate::response::ResponseSelector;
use crate::stage::{CrisisStage, EmpathyStage, FlowStage, StageId, StageOutcome, Verdict};

/// The cascade's answer to one message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub verdict: Verdict,
}

impl Reply {
    pub fn stage(&self) -> StageId {
        self.verdict.stage
    }

    pub fn label(&self) -> &str {
        &self.verdict.label
    }
}

/// Runs crisis, flow and empathy stages in that order and answers with the
/// first stage that claims the message.
///
/// The order is a safety property: a crisis verdict is never overridden by a
/// later stage.
#[derive(Clone)]
pub struct Cascade {
    crisis: CrisisStage,
    flow: FlowStage,
    empathy: EmpathyStage,
    responses: ResponseSelector,
}

impl Cascade {
    pub fn new(
        crisis: CrisisStage,
        flow: FlowStage,
        empathy: EmpathyStage,
        responses: ResponseSelector,
    ) -> Self {
        Self {
            crisis,
            flow,
            empathy,
            responses,
        }
    }

    pub fn from_models(
        models: LoadedModels,
        responses: ResponseSelector,
        crisis_positive_label: &str,
        flow_unknown_label: &str,
    ) -> Self {
        Self::new(
            CrisisStage::new(
                models.crisis_detector,
                models.crisis_classifier,
                crisis_positive_label,
            ),
            FlowStage::new(models.flow_model, flow_unknown_label),
            EmpathyStage::new(models.empathy_model),
            responses,
        )
    }

    /// Classifies `text` and picks the response. Always returns a reply.
    pub fn respond(&self, text: &str) -> Reply {
        let verdict = self.decide(text);
        let table = self.responses.table(verdict.stage);
        if !table.contains(&verdict.label) {
            log::warn!(
                "{} stage produced unmapped label '{}', answering with default",
                verdict.stage,
                verdict.label
            );
        }
        let text = table.select(&verdict.label).to_string();
        Reply { text, verdict }
    }

    /// Finds the stage that claims the message.
    pub fn decide(&self, text: &str) -> Verdict {
        if let StageOutcome::Terminal(verdict) = self.crisis.evaluate(text) {
            log::debug!("Crisis stage fired with '{}'", verdict.label);
            return verdict;
        }
        if let StageOutcome::Terminal(verdict) = self.flow.evaluate(text) {
            log::debug!("Flow stage fired with '{}'", verdict.label);
            return verdict;
        }
        let verdict = self.empathy.evaluate(text);
        log::debug!("Empathy stage answered with '{}'", verdict.label);
        verdict
    }
}
