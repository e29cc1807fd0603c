//! Flowchart shape templates: what each kind looks like ([`factory`]) and
//! where the templates live ([`registry`]).

mod factory;
mod registry;

pub use factory::build_template;
pub use registry::{Library, ShapeTemplate};

use crate::theme::ThemeMode;
use serde::{Deserialize, Serialize};

/// Name of the label every chain shape shows its step number in.
pub const STEP_NUMBER_LABEL: &str = "Step #";
pub const STEP_DESCRIPTION_LABEL: &str = "Step description";
pub const NOTE_NUMBER_LABEL: &str = "Number associated with the step";
pub const NOTE_DETAILS_LABEL: &str = "Details for this step";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    EnterProcess,
    EndProcess,
    Decision,
    UserAction,
    SystemAction,
    ContinuesFlow,
    ConcurrentStep,
    DecisionYes,
    DecisionNo,
    Note,
}

impl ShapeKind {
    /// Every kind in sticker sheet order.
    pub const ALL: [ShapeKind; 10] = [
        ShapeKind::EnterProcess,
        ShapeKind::EndProcess,
        ShapeKind::UserAction,
        ShapeKind::Decision,
        ShapeKind::SystemAction,
        ShapeKind::ContinuesFlow,
        ShapeKind::ConcurrentStep,
        ShapeKind::DecisionYes,
        ShapeKind::DecisionNo,
        ShapeKind::Note,
    ];

    pub fn human_name(self) -> &'static str {
        match self {
            ShapeKind::EnterProcess => "Enter process",
            ShapeKind::EndProcess => "End process",
            ShapeKind::Decision => "Decision",
            ShapeKind::UserAction => "User action or system response",
            ShapeKind::SystemAction => "System action",
            ShapeKind::ContinuesFlow => "Continues to or from another flow",
            ShapeKind::ConcurrentStep => "Concurrent step",
            ShapeKind::DecisionYes => "Decision - Yes",
            ShapeKind::DecisionNo => "Decision - No",
            ShapeKind::Note => "Note",
        }
    }

    /// Short identifier used in user-facing error messages.
    pub fn key(self) -> &'static str {
        match self {
            ShapeKind::EnterProcess => "enterProcess",
            ShapeKind::EndProcess => "endProcess",
            ShapeKind::Decision => "decision",
            ShapeKind::UserAction => "userAction",
            ShapeKind::SystemAction => "systemAction",
            ShapeKind::ContinuesFlow => "continuesFlow",
            ShapeKind::ConcurrentStep => "concurrentStep",
            ShapeKind::DecisionYes => "decisionYes",
            ShapeKind::DecisionNo => "decisionNo",
            ShapeKind::Note => "note",
        }
    }

    /// Row height reserved for the kind on the sticker sheet.
    pub fn sticker_height(self) -> f32 {
        match self {
            ShapeKind::EnterProcess | ShapeKind::EndProcess => 28.0,
            ShapeKind::Decision
            | ShapeKind::UserAction
            | ShapeKind::SystemAction
            | ShapeKind::ContinuesFlow => 54.0,
            ShapeKind::ConcurrentStep => 16.0,
            ShapeKind::DecisionYes | ShapeKind::DecisionNo => 19.0,
            ShapeKind::Note => 26.0,
        }
    }

    /// Whether the sticker sheet prints the kind's name next to it. The
    /// process pills and the note already read as what they are.
    pub fn has_sticker_label(self) -> bool {
        !matches!(
            self,
            ShapeKind::EnterProcess | ShapeKind::EndProcess | ShapeKind::Note
        )
    }

    pub fn template_name(self, mode: ThemeMode) -> String {
        format!("{} mode / {}", mode.template_prefix(), self.human_name())
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
