use super::ids::{ModelId, ResidueId};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityType {
    #[default]
    Unknown,
    Polymer,
    NonPolymer,
    Water,
}

#[derive(Debug, Error)]
#[error("Invalid entity type string")]
pub struct ParseEntityTypeError;

impl FromStr for EntityType {
    type Err = ParseEntityTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polymer" => Ok(EntityType::Polymer),
            "non-polymer" | "nonpolymer" => Ok(EntityType::NonPolymer),
            "water" => Ok(EntityType::Water),
            "unknown" | "?" | "." => Ok(EntityType::Unknown),
            _ => Err(ParseEntityTypeError),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EntityType::Unknown => "unknown",
                EntityType::Polymer => "polymer",
                EntityType::NonPolymer => "non-polymer",
                EntityType::Water => "water",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Chain identifier used by the structure (label_asym_id in mmCIF terms).
    pub name: String,
    /// Author chain identifier. A chain record holds a single author name; readers split
    /// the chain when the author name changes.
    pub auth_name: String,
    pub entity_type: EntityType,
    pub(crate) residues: Vec<ResidueId>, // Ordered list of residue IDs belonging to this chain
    pub(crate) model_id: ModelId,
}

impl Chain {
    /// Creates a chain whose author name equals its name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            auth_name: name.to_string(),
            entity_type: EntityType::Unknown,
            residues: Vec::new(),
            model_id: ModelId::default(),
        }
    }

    pub fn with_auth_name(mut self, auth_name: &str) -> Self {
        self.auth_name = auth_name.to_string();
        self
    }

    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }

    pub fn model_id(&self) -> ModelId {
        self.model_id
    }
}
