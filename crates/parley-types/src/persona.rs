//! Bot personas: the reply styles a scripted participant can speak in.
//!
//! Personas are a closed set of presets. A persona tag read back from storage
//! that matches no preset is preserved as [`Persona::Custom`] so it can still
//! be answered (from the generic template list) and round-tripped unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt;
use std::str::FromStr;

/// Reply style of an automated participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Persona {
    CustomerService,
    Technical,
    Humorous,
    Creative,
    Advisor,
    Friendly,
    Professional,
    Funny,
    Motivational,
    /// A tag with no preset templates or keywords.
    Custom(String),
}

impl Persona {
    /// Every preset persona, in catalogue order.
    pub const PRESETS: [Persona; 9] = [
        Persona::CustomerService,
        Persona::Technical,
        Persona::Humorous,
        Persona::Creative,
        Persona::Advisor,
        Persona::Friendly,
        Persona::Professional,
        Persona::Funny,
        Persona::Motivational,
    ];

    /// Stable identifier used in storage, cache keys, and the API.
    pub fn as_str(&self) -> &str {
        match self {
            Persona::CustomerService => "customer_service",
            Persona::Technical => "technical",
            Persona::Humorous => "humorous",
            Persona::Creative => "creative",
            Persona::Advisor => "advisor",
            Persona::Friendly => "friendly",
            Persona::Professional => "professional",
            Persona::Funny => "funny",
            Persona::Motivational => "motivational",
            Persona::Custom(tag) => tag,
        }
    }

    /// Catalogue entry for a preset bot role, if this persona is one.
    ///
    /// Only the five group-chat roles carry a profile; the remaining presets
    /// predate the role catalogue and are answered but not advertised.
    pub fn profile(&self) -> Option<PersonaProfile> {
        let (name, personality, response_tendency) = match self {
            Persona::CustomerService => (
                "Customer Service Bot",
                "Professional, patient and helpful; good at solving problems and giving detailed information",
                "Explains in detail, offers solutions, keeps a professional tone",
            ),
            Persona::Technical => (
                "Technical Bot",
                "Rigorous and knowledgeable; good at technical questions and code analysis",
                "Gives technical detail, analyses root causes, proposes concrete implementations",
            ),
            Persona::Humorous => (
                "Humorous Bot",
                "Lively and witty; good at lightening the mood and telling jokes",
                "Playful language, jokes, light-hearted answers",
            ),
            Persona::Creative => (
                "Creative Bot",
                "Imaginative and inventive; good at brainstorming and fresh thinking",
                "Offers creative ideas, encourages innovation, thinks outside the box",
            ),
            Persona::Advisor => (
                "Advisor Bot",
                "Calm and experienced; good at giving advice and guidance",
                "Gives professional recommendations, shares experience, thinks strategically",
            ),
            _ => return None,
        };
        Some(PersonaProfile {
            persona: self.clone(),
            name: name.to_string(),
            personality: personality.to_string(),
            response_tendency: response_tendency.to_string(),
        })
    }

    /// The role catalogue offered to users when adding bots to a group.
    pub fn catalogue() -> Vec<PersonaProfile> {
        Self::PRESETS.iter().filter_map(Persona::profile).collect()
    }
}

impl Default for Persona {
    fn default() -> Self {
        Persona::Friendly
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag.is_empty() {
            return Err("persona tag must not be empty".to_string());
        }
        let persona = match tag.to_lowercase().as_str() {
            "customer_service" => Persona::CustomerService,
            "technical" => Persona::Technical,
            "humorous" => Persona::Humorous,
            "creative" => Persona::Creative,
            "advisor" => Persona::Advisor,
            "friendly" => Persona::Friendly,
            "professional" => Persona::Professional,
            "funny" => Persona::Funny,
            "motivational" => Persona::Motivational,
            _ => Persona::Custom(tag.to_string()),
        };
        Ok(persona)
    }
}

impl Serialize for Persona {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Persona {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Descriptive catalogue entry for a preset bot role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    #[serde(rename = "type")]
    pub persona: Persona,
    pub name: String,
    pub personality: String,
    pub response_tendency: String,
}
