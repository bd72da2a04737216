use crate::error::{Result, ScraperError};
use std::path::{Path, PathBuf};

/// The closed set of place types an entity id can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Restaurant,
    Hotel,
    Attraction,
}

impl EntityType {
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "R" => Ok(EntityType::Restaurant),
            "H" => Ok(EntityType::Hotel),
            "A" => Ok(EntityType::Attraction),
            other => Err(ScraperError::UnknownType(other.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EntityType::Restaurant => "R",
            EntityType::Hotel => "H",
            EntityType::Attraction => "A",
        }
    }
}

/// Parsed form of the canonical `{cityId}_{typeCode}_{sequence}` identifier.
///
/// The same derivation routes work to a crawler and computes the skip-check
/// path, so both sides always agree on what "already fetched" means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityId {
    pub city_id: String,
    pub entity_type: EntityType,
    pub sequence: String,
}

impl EntityId {
    /// Parses an id string, requiring exactly three non-empty components.
    pub fn parse(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split('_').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ScraperError::MalformedId(id.to_string()));
        }

        Ok(EntityId {
            city_id: parts[0].to_string(),
            entity_type: EntityType::from_code(parts[1])?,
            sequence: parts[2].to_string(),
        })
    }

    /// Output location for an entity: `{base}/{cityId}/{id}.json`.
    pub fn storage_path(base: &Path, id: &str) -> Result<PathBuf> {
        let parsed = Self::parse(id)?;
        Ok(base.join(parsed.city_id).join(format!("{}.json", id)))
    }
}
