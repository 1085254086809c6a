use shared::{KnowledgeRecord, PredictionSet};

use super::ImageHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    ImageSelected,
    Analyzing,
    Analyzed,
}

/// Everything the controller knows. Renderers get read-only snapshots of this.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkflowState {
    pub image: Option<ImageHandle>,
    pub predictions: PredictionSet,
    pub knowledge: Option<KnowledgeRecord>,
    pub analyzing: bool,
    pub loading_knowledge: bool,
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match (&self.image, self.analyzing) {
            (None, _) => WorkflowPhase::Idle,
            (Some(_), true) => WorkflowPhase::Analyzing,
            (Some(_), false) if self.has_results() => WorkflowPhase::Analyzed,
            (Some(_), false) => WorkflowPhase::ImageSelected,
        }
    }

    /// Results panel is visible once predictions exist or knowledge is involved.
    pub fn has_results(&self) -> bool {
        !self.predictions.is_empty() || self.knowledge.is_some() || self.loading_knowledge
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}
