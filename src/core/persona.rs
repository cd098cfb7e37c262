//! Persona and model selection policy.
//!
//! Everything here is a pure lookup: a persona decides the system instruction
//! sent with each generation request, and the web search toggle decides which
//! model is used and whether the search tool is attached.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Persona {
    #[default]
    GeneralAssistant,
    CodingSpecialist,
    CreativeWriter,
    DataAnalyst,
}

impl Persona {
    /// Selection order used by the persona picker.
    pub const ALL: [Persona; 4] = [
        Persona::GeneralAssistant,
        Persona::CodingSpecialist,
        Persona::CreativeWriter,
        Persona::DataAnalyst,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Persona::GeneralAssistant => "General Assistant",
            Persona::CodingSpecialist => "Coding Specialist",
            Persona::CreativeWriter => "Creative Writer",
            Persona::DataAnalyst => "Data Analyst",
        }
    }

    pub fn system_instruction(self) -> &'static str {
        match self {
            Persona::GeneralAssistant => {
                "You are Nexus, a highly capable general-purpose AI agent. You are helpful, concise, and professional."
            }
            Persona::CodingSpecialist => {
                "You are an expert senior software engineer. When providing code, use modern best practices, explain complex logic, and ensure types are handled if using TypeScript. Always use markdown code blocks."
            }
            Persona::CreativeWriter => {
                "You are a creative writing partner. You excel at storytelling, poetic descriptions, and nuanced character development. Your tone is expressive and engaging."
            }
            Persona::DataAnalyst => {
                "You are a meticulous data analyst. You focus on logical reasoning, statistical accuracy, and structured data presentation. You use tables and lists whenever appropriate."
            }
        }
    }

    /// The persona after this one in [`Persona::ALL`], wrapping around.
    pub fn next(self) -> Persona {
        let index = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Parse a persona from its display name or a short alias, ignoring case.
    pub fn parse(input: &str) -> Option<Persona> {
        let normalized = input.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "general" | "general assistant" | "assistant" => Some(Persona::GeneralAssistant),
            "coder" | "coding" | "coding specialist" => Some(Persona::CodingSpecialist),
            "writer" | "creative" | "creative writer" => Some(Persona::CreativeWriter),
            "analyst" | "data" | "data analyst" => Some(Persona::DataAnalyst),
            _ => None,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl TryFrom<String> for Persona {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Persona::parse(&value).ok_or_else(|| {
            let available: Vec<&str> = Persona::ALL.iter().map(|p| p.display_name()).collect();
            format!(
                "Persona '{}' not found. Available personas: {}",
                value,
                available.join(", ")
            )
        })
    }
}

impl From<Persona> for String {
    fn from(value: Persona) -> Self {
        value.display_name().to_string()
    }
}

/// Model identifiers for the two generation modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPolicy {
    pub fast_model: String,
    pub pro_model: String,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            pro_model: DEFAULT_PRO_MODEL.to_string(),
        }
    }
}

/// Request-time parameters derived from persona and search mode.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub system_instruction: String,
    pub search_enabled: bool,
}

impl ModelPolicy {
    pub fn model_for(&self, use_search: bool) -> &str {
        if use_search {
            &self.pro_model
        } else {
            &self.fast_model
        }
    }

    pub fn settings(&self, persona: Persona, use_search: bool) -> GenerationSettings {
        GenerationSettings {
            model: self.model_for(use_search).to_string(),
            system_instruction: persona.system_instruction().to_string(),
            search_enabled: use_search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_selects_pro_model_for_every_persona() {
        let policy = ModelPolicy::default();
        for persona in Persona::ALL {
            let settings = policy.settings(persona, true);
            assert_eq!(settings.model, DEFAULT_PRO_MODEL);
            assert!(settings.search_enabled);

            let settings = policy.settings(persona, false);
            assert_eq!(settings.model, DEFAULT_FAST_MODEL);
            assert!(!settings.search_enabled);
        }
    }

    #[test]
    fn every_persona_has_a_distinct_instruction() {
        let mut seen = std::collections::HashSet::new();
        for persona in Persona::ALL {
            assert!(!persona.system_instruction().is_empty());
            assert!(seen.insert(persona.system_instruction()));
        }
        assert!(Persona::GeneralAssistant
            .system_instruction()
            .starts_with("You are Nexus"));
    }

    #[test]
    fn parse_accepts_aliases_and_display_names() {
        assert_eq!(Persona::parse("coder"), Some(Persona::CodingSpecialist));
        assert_eq!(Persona::parse("Creative Writer"), Some(Persona::CreativeWriter));
        assert_eq!(Persona::parse("  DATA "), Some(Persona::DataAnalyst));
        assert_eq!(Persona::parse("pirate"), None);
    }

    #[test]
    fn next_cycles_through_all_personas() {
        let mut persona = Persona::GeneralAssistant;
        for _ in 0..Persona::ALL.len() {
            persona = persona.next();
        }
        assert_eq!(persona, Persona::GeneralAssistant);
        assert_eq!(Persona::DataAnalyst.next(), Persona::GeneralAssistant);
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&Persona::CodingSpecialist).expect("serialize");
        assert_eq!(json, "\"Coding Specialist\"");
        let back: Persona = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Persona::CodingSpecialist);
        assert!(serde_json::from_str::<Persona>("\"Pirate\"").is_err());
    }

    #[test]
    fn custom_models_are_honoured() {
        let policy = ModelPolicy {
            fast_model: "fast-x".into(),
            pro_model: "pro-x".into(),
        };
        assert_eq!(policy.model_for(false), "fast-x");
        assert_eq!(policy.model_for(true), "pro-x");
    }
}
