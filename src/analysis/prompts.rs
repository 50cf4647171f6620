use super::persona::Persona;
use super::report::PersonaResponses;
use super::validation::ProblemStatement;
use crate::client::GenerateRequest;
use std::fmt::Write;

const SYNTHESIS_PREAMBLE: &str = "You are a senior advisor. Three experts have analyzed the same \
problem from different angles. Synthesize their analyses into one clear, actionable \
recommendation.";

const SYNTHESIS_INSTRUCTIONS: &str = "Combine the strongest points of each analysis, resolve any \
conflicts between them, and produce a final recommendation in markdown: start with a short \
summary, then list concrete next steps.";

/// The fourth call of a run: merges the three persona outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    prompt: String,
}

impl SynthesisRequest {
    /// Interpolate the problem and every persona's text (or error placeholder) into the template
    pub fn build(problem: &ProblemStatement, responses: &PersonaResponses) -> Self {
        let mut prompt = String::with_capacity(problem.as_str().len() + 1024);
        prompt.push_str(SYNTHESIS_PREAMBLE);
        let _ = write!(prompt, "\n\nORIGINAL PROBLEM:\n{}\n", problem.as_str());

        for persona in Persona::ALL {
            let _ = write!(
                prompt,
                "\n{} ANALYSIS:\n{}\n",
                persona.heading(),
                responses.text_for(persona)
            );
        }

        prompt.push('\n');
        prompt.push_str(SYNTHESIS_INSTRUCTIONS);
        Self { prompt }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Synthesis carries no system instruction
    pub fn to_payload(&self) -> GenerateRequest {
        GenerateRequest::user(self.prompt.clone())
    }
}
