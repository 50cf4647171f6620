//! triad - three AI perspectives, one recommendation
//!
//! This library validates a problem statement, asks three personas (security,
//! design, efficiency) for their analyses concurrently through a relay, and
//! synthesizes the results. It also provides the relay itself.

#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod logger;
pub mod relay;
pub mod render;
pub mod ui;

pub use analysis::{AnalysisReport, Orchestrator, Persona, Presenter, RunError};
pub use client::{ApiClient, CallError, CallErrorKind, CallResult, ModelClient};
pub use config::Config;
