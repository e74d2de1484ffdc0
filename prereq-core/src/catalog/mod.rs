//! Course catalog: loading the course export and answering per-course lookups.

pub mod describe;
pub mod groups;
pub mod types;

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub use describe::{CardStatus, DisplayNode, card_status, describe};
pub use groups::{AlternativeGroups, CourseReq, extract_alternative_groups, list_direct_prerequisite_ids};
pub use types::{CountReq, CourseId, CourseRecord, CourseRef, Logic, RequirementKind, RequirementNode};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid course export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("course export contains no courses")]
    Empty,
}

#[derive(Deserialize)]
struct WrappedExport {
    courses: Vec<CourseRecord>,
}

/// All known courses, keyed by canonical id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: HashMap<CourseId, CourseRecord>,
}

impl Catalog {
    /// Accepts either a bare array of courses or `{ "courses": [...], "metadata": ... }`.
    pub fn from_json(json: &str) -> Result<Catalog, CatalogError> {
        let value: Value = serde_json::from_str(json)?;
        let records: Vec<CourseRecord> = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            serde_json::from_value::<WrappedExport>(value)?.courses
        };
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Catalog::from_records(records))
    }

    /// Later records win on duplicate ids.
    pub fn from_records(records: impl IntoIterator<Item = CourseRecord>) -> Catalog {
        let mut courses = HashMap::new();
        for record in records {
            let id = record.id();
            if courses.insert(id.clone(), record).is_some() {
                log::warn!("duplicate course {} in export, keeping the last one", id);
            }
        }
        log::debug!("catalog loaded with {} courses", courses.len());
        Catalog { courses }
    }

    pub fn get(&self, id: &str) -> Option<&CourseRecord> {
        self.courses.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.courses.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Sorted for deterministic iteration.
    pub fn ids(&self) -> Vec<&CourseId> {
        let mut ids: Vec<&CourseId> = self.courses.keys().collect();
        ids.sort();
        ids
    }

    /// `None` both for unknown courses and for courses whose tree is `null`.
    pub fn requirements(&self, id: &str) -> Option<&RequirementNode> {
        self.get(id).and_then(|c| c.requirements.as_ref())
    }

    pub fn title(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|c| c.title.as_deref())
    }
}
