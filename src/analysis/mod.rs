//! Three-persona analysis with a synthesized recommendation.
//!
//! A run validates the problem statement, asks each [`Persona`] for its view
//! concurrently, waits for all three, and then asks for a synthesis that
//! quotes every persona. Progress is reported through a [`Presenter`].

mod orchestrator;
mod persona;
mod presenter;
mod prompts;
mod report;
mod validation;

pub use orchestrator::{Orchestrator, RunError};
pub use persona::{Persona, PersonaProfile, PersonaRequest};
pub use presenter::{NullPresenter, Presenter, RunPhase};
pub use prompts::SynthesisRequest;
pub use report::{AnalysisReport, PersonaResponses};
pub use validation::{DEFAULT_MAX_INPUT_CHARS, ProblemStatement, ValidationError};
