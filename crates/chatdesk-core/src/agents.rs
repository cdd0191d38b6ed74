//! Agent identities and their display profiles
//!
//! The server names the agent behind each response with an opaque id. The
//! client only uses it to pick an icon, a color tone, a description and a
//! list of suggested follow-up questions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a server-side responder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Profile for this agent, if it is one the client knows
    pub fn profile(&self) -> Option<&'static AgentProfile> {
        AgentProfile::lookup(&self.0)
    }

    /// Human-readable name; unknown ids are shown as-is
    pub fn display_name(&self) -> &str {
        self.profile().map(|p| p.name).unwrap_or(&self.0)
    }

    /// Tone used to color the agent badge
    pub fn tone(&self) -> AgentTone {
        self.profile().map(|p| p.tone).unwrap_or(AgentTone::Other)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Color family of an agent badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentTone {
    General,
    Sales,
    Technical,
    Contact,
    Other,
}

/// Static display profile of a known agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    /// Id sent by the server
    pub id: &'static str,
    /// Short ids accepted by `/agent <id>`
    pub aliases: &'static [&'static str],
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub tone: AgentTone,
    /// Message that asks the server to hand over to this agent; the server
    /// routes on Spanish keywords
    pub selection_prompt: &'static str,
    pub capabilities: &'static [&'static str],
    pub suggestions: &'static [&'static str],
}

const KNOWN_AGENTS: &[AgentProfile] = &[
    AgentProfile {
        id: "GeneralAgent",
        aliases: &["general"],
        name: "General Agent",
        description: "General information about the company",
        icon: "●",
        tone: AgentTone::General,
        selection_prompt: "Quiero hablar con el agente general",
        capabilities: &[
            "Give general information about the company",
            "Answer questions about the company",
            "Route you to the right agent for your needs",
        ],
        suggestions: &[
            "What services do you offer?",
            "Tell me about the company",
            "Quiero hablar con ventas",
        ],
    },
    AgentProfile {
        id: "SalesAgent",
        aliases: &["sales"],
        name: "Sales Agent",
        description: "Products, services and pricing specialist",
        icon: "$",
        tone: AgentTone::Sales,
        selection_prompt: "Quiero hablar con el agente de ventas",
        capabilities: &[
            "Explain products and services",
            "Give pricing information",
            "Explain competitive advantages",
        ],
        suggestions: &[
            "What are your prices?",
            "Is there a free trial?",
            "Quiero dejar mis datos",
        ],
    },
    AgentProfile {
        id: "EngineerAgent",
        aliases: &["engineer", "technical", "tech"],
        name: "Technical Agent",
        description: "Technical questions and solutions specialist",
        icon: "⚙",
        tone: AgentTone::Technical,
        selection_prompt: "Quiero hablar con el agente técnico",
        capabilities: &[
            "Answer technical questions",
            "Explain how the services work",
            "Describe integrations and APIs",
        ],
        suggestions: &[
            "Which integrations do you support?",
            "Is there a public API?",
            "How is my data secured?",
        ],
    },
    AgentProfile {
        id: "DataCollectionAgent",
        aliases: &["data", "contact"],
        name: "Contact Agent",
        description: "Collects your contact details",
        icon: "✉",
        tone: AgentTone::Contact,
        selection_prompt: "Quiero dejar mis datos de contacto",
        capabilities: &[
            "Collect your contact details",
            "Record your interest in specific products",
            "Arrange for a representative to contact you",
        ],
        suggestions: &["I'd like to be contacted", "What details do you need?"],
    },
];

impl AgentProfile {
    /// All agents the client can display and select
    pub fn all() -> &'static [AgentProfile] {
        KNOWN_AGENTS
    }

    /// Find a profile by server id or alias (case-insensitive)
    pub fn lookup(id: &str) -> Option<&'static AgentProfile> {
        let id = id.trim();
        KNOWN_AGENTS.iter().find(|p| {
            p.id.eq_ignore_ascii_case(id) || p.aliases.iter().any(|a| a.eq_ignore_ascii_case(id))
        })
    }

    /// Whether this agent collects contact data
    pub fn is_data_collection(&self) -> bool {
        self.tone == AgentTone::Contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_server_id_and_alias() {
        assert_eq!(AgentProfile::lookup("SalesAgent").unwrap().name, "Sales Agent");
        assert_eq!(AgentProfile::lookup("technical").unwrap().id, "EngineerAgent");
        assert_eq!(AgentProfile::lookup(" DATA ").unwrap().id, "DataCollectionAgent");
    }

    #[test]
    fn test_unknown_agent_falls_back_to_id() {
        let id = AgentId::new("BillingAgent");
        assert!(id.profile().is_none());
        assert_eq!(id.display_name(), "BillingAgent");
        assert_eq!(id.tone(), AgentTone::Other);
    }

    #[test]
    fn test_every_agent_has_suggestions_and_prompt() {
        for profile in AgentProfile::all() {
            assert!(!profile.suggestions.is_empty(), "{}", profile.id);
            assert!(!profile.selection_prompt.is_empty(), "{}", profile.id);
        }
    }

    #[test]
    fn test_selection_prompts_carry_routing_keywords() {
        let keywords = [
            ("GeneralAgent", "agente general"),
            ("SalesAgent", "ventas"),
            ("EngineerAgent", "técnico"),
            ("DataCollectionAgent", "dejar mis datos"),
        ];
        for (id, keyword) in keywords {
            let prompt = AgentProfile::lookup(id).unwrap().selection_prompt.to_lowercase();
            assert!(prompt.contains(keyword), "{}: {}", id, prompt);
        }
        // Routing checks the technical keywords first
        let sales = AgentProfile::lookup("sales").unwrap().selection_prompt.to_lowercase();
        assert!(!sales.contains("técnico") && !sales.contains("tecnico"));
    }

    #[test]
    fn test_data_collection_agent() {
        assert!(AgentProfile::lookup("DataCollectionAgent").unwrap().is_data_collection());
        assert!(!AgentProfile::lookup("GeneralAgent").unwrap().is_data_collection());
    }
}
