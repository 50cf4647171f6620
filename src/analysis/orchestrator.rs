//! Runs one analysis: validate, fan out to the personas, wait for all of
//! them, then synthesize.

use super::persona::{Persona, PersonaRequest};
use super::presenter::{Presenter, RunPhase};
use super::prompts::SynthesisRequest;
use super::report::{AnalysisReport, PersonaResponses};
use super::validation::{DEFAULT_MAX_INPUT_CHARS, ProblemStatement, ValidationError};
use crate::client::{ApiClient, CallErrorKind, CallResult, GenerateRequest, ModelClient};
use crate::config::ClientConfig;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Why a run did not complete
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Rejected(#[from] ValidationError),
    #[error("An analysis is already running")]
    Busy,
    #[error("Analysis cancelled")]
    Cancelled,
    #[error("Analysis failed unexpectedly: {message}")]
    Unexpected {
        message: String,
        /// Persona results that settled before the failure
        partial: PersonaResponses,
    },
}

impl RunError {
    /// Terminal phase a run ends in for this error
    pub const fn phase(&self) -> RunPhase {
        match self {
            Self::Rejected(_) => RunPhase::Rejected,
            Self::Busy => RunPhase::Idle,
            Self::Cancelled => RunPhase::Cancelled,
            Self::Unexpected { .. } => RunPhase::Failed,
        }
    }
}

/// Clears the busy flag however the run ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives analysis runs against a model client. One run at a time.
pub struct Orchestrator {
    client: Arc<dyn ModelClient>,
    max_input_chars: usize,
    busy: AtomicBool,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            busy: AtomicBool::new(false),
        }
    }

    /// Orchestrator over the HTTP relay client described by `config`
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(Arc::new(client)).with_max_input_chars(config.max_input_chars))
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// True while a run is in progress
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validate input without starting a run
    pub fn validate(&self, raw: &str) -> Result<ProblemStatement, ValidationError> {
        ProblemStatement::parse(raw, self.max_input_chars)
    }

    /// Run one complete analysis.
    ///
    /// An overlapping call returns [`RunError::Busy`] without touching the presenter.
    pub async fn run(
        &self,
        raw: &str,
        presenter: &dyn Presenter,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, RunError> {
        let Some(_guard) = self.try_begin() else {
            tracing::warn!("Analysis requested while another is running");
            return Err(RunError::Busy);
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", %run_id);
        let result = self
            .run_phases(run_id, raw, presenter, cancel)
            .instrument(span)
            .await;

        if let Err(error) = &result {
            presenter.on_phase(error.phase());
        }
        result
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.busy))
    }

    async fn run_phases(
        &self,
        run_id: Uuid,
        raw: &str,
        presenter: &dyn Presenter,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, RunError> {
        let started = Instant::now();

        presenter.on_phase(RunPhase::Validating);
        let problem = self.validate(raw).inspect_err(|error| {
            tracing::info!(%error, "Problem statement rejected");
        })?;

        presenter.on_phase(RunPhase::PersonasRunning);
        let personas = self.run_personas(&problem, presenter, cancel).await?;
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        presenter.on_phase(RunPhase::Synthesizing);
        let request = SynthesisRequest::build(&problem, &personas);
        let synthesis = match self
            .spawn_call(request.to_payload(), cancel.child_token())
            .await
        {
            Ok(result) => result,
            Err(join_error) => {
                return Err(RunError::Unexpected {
                    message: describe_join_error("Synthesis", &join_error),
                    partial: personas,
                });
            }
        };
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        presenter.on_synthesis_result(&synthesis);
        presenter.on_phase(RunPhase::Complete);

        let elapsed = started.elapsed();
        tracing::info!(
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            persona_failures = personas.failures(),
            synthesis_ok = synthesis.is_ok(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            run_id,
            problem,
            personas,
            synthesis,
            elapsed,
        })
    }

    /// Dispatch every persona at once and wait for all of them (a barrier, not a race)
    async fn run_personas(
        &self,
        problem: &ProblemStatement,
        presenter: &dyn Presenter,
        cancel: &CancellationToken,
    ) -> Result<PersonaResponses, RunError> {
        let mut pending: FuturesUnordered<_> = Persona::ALL
            .into_iter()
            .map(|persona| {
                let payload = PersonaRequest::new(persona, problem).to_payload();
                let handle = self.spawn_call(payload, cancel.child_token());
                async move { (persona, handle.await) }
            })
            .collect();

        let mut responses = PersonaResponses::new();
        let mut fault = None;

        while let Some((persona, joined)) = pending.next().await {
            match joined {
                Ok(result) => {
                    tracing::info!(
                        persona = persona.as_ref(),
                        ok = result.is_ok(),
                        "Persona settled"
                    );
                    // a cancelled run reports itself once, not per persona
                    let cancelled = matches!(&result, Err(e) if e.kind == CallErrorKind::Cancelled);
                    if !(cancelled && cancel.is_cancelled()) {
                        presenter.on_persona_result(persona, &result);
                    }
                    responses.insert(persona, result);
                }
                Err(join_error) => {
                    let message = describe_join_error(persona.label(), &join_error);
                    tracing::error!(persona = persona.as_ref(), %message, "Persona task faulted");
                    // keep draining so the other results are not lost
                    fault.get_or_insert(message);
                }
            }
        }

        match fault {
            Some(message) => Err(RunError::Unexpected {
                message,
                partial: responses,
            }),
            None => Ok(responses),
        }
    }

    fn spawn_call(
        &self,
        payload: GenerateRequest,
        cancel: CancellationToken,
    ) -> JoinHandle<CallResult> {
        let client = Arc::clone(&self.client);
        tokio::spawn(async move { client.call(&payload, &cancel).await }.in_current_span())
    }
}

fn describe_join_error(what: &str, error: &JoinError) -> String {
    if error.is_panic() {
        format!("{what} task panicked")
    } else {
        format!("{what} task was aborted")
    }
}
