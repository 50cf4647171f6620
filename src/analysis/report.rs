use super::persona::Persona;
use super::validation::ProblemStatement;
use crate::client::{CallResult, display_text};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Settled persona calls of one run, keyed by persona
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaResponses {
    results: BTreeMap<Persona, CallResult>,
}

impl PersonaResponses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, persona: Persona, result: CallResult) {
        self.results.insert(persona, result);
    }

    pub fn get(&self, persona: Persona) -> Option<&CallResult> {
        self.results.get(&persona)
    }

    /// Text for a persona: its output, its error placeholder, or a note that nothing arrived
    pub fn text_for(&self, persona: Persona) -> String {
        self.get(persona)
            .map_or_else(|| "Error: No response received.".to_string(), display_text)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True once every persona has settled
    pub fn is_complete(&self) -> bool {
        Persona::ALL.iter().all(|persona| self.results.contains_key(persona))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Persona, &CallResult)> {
        self.results.iter().map(|(persona, result)| (*persona, result))
    }

    pub fn failures(&self) -> usize {
        self.results.values().filter(|result| result.is_err()).count()
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub problem: ProblemStatement,
    pub personas: PersonaResponses,
    pub synthesis: CallResult,
    pub elapsed: Duration,
}

impl AnalysisReport {
    pub fn synthesis_text(&self) -> String {
        display_text(&self.synthesis)
    }
}
