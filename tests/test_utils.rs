#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use triad::analysis::{Persona, Presenter, RunPhase};
use triad::client::{
    AttemptError, CallError, CallResult, GenerateRequest, ModelClient, RelayReply, Transport,
};

/// Transport that replays a script and records when each attempt happened
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RelayReply, AttemptError>>>,
    pub sent_at: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedTransport {
    /// The last entry is repeated once the script runs out
    pub fn new(script: Vec<Result<RelayReply, AttemptError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            sent_at: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.sent_at.lock().len()
    }

    /// Gaps between consecutive attempts
    pub fn gaps(&self) -> Vec<Duration> {
        self.sent_at
            .lock()
            .windows(2)
            .map(|pair| pair[1].duration_since(pair[0]))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: &GenerateRequest) -> Result<RelayReply, AttemptError> {
        self.sent_at.lock().push(tokio::time::Instant::now());
        let mut script = self.script.lock();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or_else(|| Err(AttemptError::Network("script exhausted".to_string())))
    }
}

pub fn ok_text(text: &str) -> Result<RelayReply, AttemptError> {
    Ok(RelayReply {
        status: 200,
        body: serde_json::json!({ "text": text }).to_string(),
    })
}

pub fn status(code: u16) -> Result<RelayReply, AttemptError> {
    Ok(RelayReply {
        status: code,
        body: serde_json::json!({ "error": "scripted" }).to_string(),
    })
}

/// Which persona a request was built for, if any
pub fn persona_of(request: &GenerateRequest) -> Option<Persona> {
    let system = request.system_text()?;
    Persona::ALL
        .into_iter()
        .find(|persona| persona.instruction() == system)
}

type Responder = Box<dyn Fn(&GenerateRequest) -> CallResult + Send + Sync>;

/// Model client fake that records requests and how many were in flight at once
pub struct RecordingClient {
    delay: Duration,
    responder: Responder,
    requests: Mutex<Vec<GenerateRequest>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingClient {
    pub fn new<F>(delay: Duration, responder: F) -> Self
    where
        F: Fn(&GenerateRequest) -> CallResult + Send + Sync + 'static,
    {
        Self {
            delay,
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Persona calls answer "<persona> says hi", synthesis answers "final answer"
    pub fn echo(delay: Duration) -> Self {
        Self::new(delay, |request| {
            Ok(persona_of(request).map_or_else(
                || "final answer".to_string(),
                |persona| format!("{} says hi", persona.as_ref()),
            ))
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelClient for RecordingClient {
    async fn call(&self, request: &GenerateRequest, cancel: &CancellationToken) -> CallResult {
        self.requests.lock().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = tokio::select! {
            () = cancel.cancelled() => Err(CallError::cancelled(1)),
            () = tokio::time::sleep(self.delay) => (self.responder)(request),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Phase(RunPhase),
    Persona(Persona, String),
    Synthesis(String),
}

/// Presenter that records everything it is told
#[derive(Default)]
pub struct RecordingPresenter {
    pub events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().clone()
    }

    pub fn phases(&self) -> Vec<RunPhase> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Phase(phase) => Some(*phase),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn on_phase(&self, phase: RunPhase) {
        self.events.lock().push(PresenterEvent::Phase(phase));
    }

    fn on_persona_result(&self, persona: Persona, result: &CallResult) {
        self.events.lock().push(PresenterEvent::Persona(
            persona,
            triad::client::display_text(result),
        ));
    }

    fn on_synthesis_result(&self, result: &CallResult) {
        self.events
            .lock()
            .push(PresenterEvent::Synthesis(triad::client::display_text(result)));
    }
}

/// Counts WARN-level tracing events on the current thread
pub struct WarnCounter(pub Arc<AtomicUsize>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install a thread-local subscriber counting warnings; keep the guard alive
pub fn count_warnings() -> (Arc<AtomicUsize>, tracing::subscriber::DefaultGuard) {
    use tracing_subscriber::layer::SubscriberExt;

    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
    let guard = tracing::subscriber::set_default(subscriber);
    (count, guard)
}
