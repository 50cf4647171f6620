use super::persona::Persona;
use crate::client::CallResult;
use std::fmt;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Idle,
    Validating,
    Rejected,
    PersonasRunning,
    Synthesizing,
    Complete,
    Failed,
    Cancelled,
}

impl RunPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Complete | Self::Failed | Self::Cancelled
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Rejected => "rejected",
            Self::PersonasRunning => "personas running",
            Self::Synthesizing => "synthesizing",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Receives the progress of a run. Called only from the orchestrating task,
/// and only after the call a result belongs to has settled.
pub trait Presenter: Send + Sync {
    fn on_phase(&self, _phase: RunPhase) {}

    fn on_persona_result(&self, persona: Persona, result: &CallResult);

    fn on_synthesis_result(&self, result: &CallResult);
}

/// Discards everything
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn on_persona_result(&self, _persona: Persona, _result: &CallResult) {}

    fn on_synthesis_result(&self, _result: &CallResult) {}
}
