//! The three analytical viewpoints and their fixed instructions.

use super::validation::ProblemStatement;
use crate::client::GenerateRequest;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter};

/// One of the fixed analytical viewpoints applied to every problem
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Persona {
    Security = 0,
    Design = 1,
    Efficiency = 2,
}

/// Static description of a persona
#[derive(Debug)]
pub struct PersonaProfile {
    pub persona: Persona,
    /// Short label used in the terminal and reports
    pub label: &'static str,
    /// Heading the persona's output is filed under in the synthesis prompt
    pub heading: &'static str,
    pub instruction: &'static str,
}

/// Indexed by the persona discriminant
static PROFILES: [PersonaProfile; 3] = [
    PersonaProfile {
        persona: Persona::Security,
        label: "Claude · Security Expert",
        heading: "CLAUDE (Security Expert)",
        instruction: "You are CLAUDE, a meticulous security expert. Analyze the user's problem \
            with a focus on security, privacy, and risk. Identify threats, vulnerabilities, and \
            abuse cases, and recommend concrete safeguards. Be thorough but practical, and format \
            your answer in markdown.",
    },
    PersonaProfile {
        persona: Persona::Design,
        label: "GPT · Creative Designer",
        heading: "GPT (Creative Designer)",
        instruction: "You are GPT, an imaginative product thinker. Analyze the user's problem with \
            a focus on creative design and user experience. Propose original, user-centric \
            approaches and describe how people will feel using them. Be inspiring but concrete, \
            and format your answer in markdown.",
    },
    PersonaProfile {
        persona: Persona::Efficiency,
        label: "Gemini · Efficiency Analyst",
        heading: "GEMINI (Efficiency Analyst)",
        instruction: "You are GEMINI, a pragmatic systems analyst. Analyze the user's problem with \
            a focus on efficiency, performance, scalability, and cost. Favor the simplest solution \
            that works and quantify trade-offs where you can. Be concise, and format your answer \
            in markdown.",
    },
];

impl Persona {
    /// Every persona, in dispatch order
    pub const ALL: [Self; 3] = [Self::Security, Self::Design, Self::Efficiency];

    #[allow(clippy::as_conversions)]
    pub fn profile(self) -> &'static PersonaProfile {
        &PROFILES[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.profile().label
    }

    pub fn heading(self) -> &'static str {
        self.profile().heading
    }

    pub fn instruction(self) -> &'static str {
        self.profile().instruction
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A persona paired with the problem it should analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaRequest {
    pub persona: Persona,
    pub problem: ProblemStatement,
}

impl PersonaRequest {
    pub fn new(persona: Persona, problem: &ProblemStatement) -> Self {
        Self {
            persona,
            problem: problem.clone(),
        }
    }

    /// Wire payload: identical user text for every persona, persona-specific system instruction
    pub fn to_payload(&self) -> GenerateRequest {
        GenerateRequest::user(self.problem.as_str())
            .with_system_instruction(self.persona.instruction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_profile_table_matches_discriminants() {
        for persona in Persona::iter() {
            assert_eq!(persona.profile().persona, persona);
        }
        assert_eq!(Persona::iter().collect::<Vec<_>>(), Persona::ALL.to_vec());
    }

    #[test]
    fn test_instructions_name_their_focus() {
        assert!(Persona::Security.instruction().contains("security"));
        assert!(Persona::Design.instruction().contains("creative design"));
        assert!(Persona::Efficiency.instruction().contains("efficiency"));
    }

    #[test]
    fn test_persona_payload() {
        let problem = ProblemStatement::parse("Pick a database", 5000).expect("valid");
        let payload = PersonaRequest::new(Persona::Design, &problem).to_payload();
        assert_eq!(payload.user_text(), "Pick a database");
        assert_eq!(
            payload.system_text().as_deref(),
            Some(Persona::Design.instruction())
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Persona::Efficiency).expect("serialize"),
            "\"efficiency\""
        );
        assert_eq!(Persona::Security.as_ref(), "security");
    }
}
