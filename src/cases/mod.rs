#![allow(dead_code)]
//! # Test Case Registry
//!
//! Static, ordered collection of the parameter sets exercised against the
//! intelligent-builder-intake process endpoint. Entries are immutable and
//! identified by `file_id`; declaration order is kept for report readability
//! only.

use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// Classification of the file a test case submits for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Community,
    Zoning,
    Image,
    Blueprint,
    Brochure,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Community,
        FileType::Zoning,
        FileType::Image,
        FileType::Blueprint,
        FileType::Brochure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Community => "community",
            FileType::Zoning => "zoning",
            FileType::Image => "image",
            FileType::Blueprint => "blueprint",
            FileType::Brochure => "brochure",
        }
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single named parameter set for one request against the intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub file_url: String,
    pub file_type: FileType,
    pub file_id: String,
    pub builder_id: String,
    pub entity_id: String,
    pub description: String,
}

/// Read-only, ordered collection of test cases.
#[derive(Debug, Clone)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    /// The built-in case set covering every file classification.
    pub fn builtin() -> Self {
        let cases = vec![
            TestCase {
                file_url: "https://example.com/community-guide.pdf".into(),
                file_type: FileType::Community,
                file_id: "community_001".into(),
                builder_id: "builder_alpha".into(),
                entity_id: "entity_alpha".into(),
                description: "Community guide PDF for Builder Alpha".into(),
            },
            TestCase {
                file_url: "https://example.com/zoning-map.pdf".into(),
                file_type: FileType::Zoning,
                file_id: "zoning_001".into(),
                builder_id: "builder_beta".into(),
                entity_id: "entity_beta".into(),
                description: "Zoning map PDF for Builder Beta".into(),
            },
            TestCase {
                file_url: "https://example.com/floorplan.png".into(),
                file_type: FileType::Image,
                file_id: "image_001".into(),
                builder_id: "builder_gamma".into(),
                entity_id: "entity_gamma".into(),
                description: "Floor plan image for Builder Gamma".into(),
            },
            TestCase {
                file_url: "https://example.com/blueprint.docx".into(),
                file_type: FileType::Blueprint,
                file_id: "blueprint_001".into(),
                builder_id: "builder_delta".into(),
                entity_id: "entity_delta".into(),
                description: "Blueprint document for Builder Delta".into(),
            },
            TestCase {
                file_url: "https://example.com/brochure.pdf".into(),
                file_type: FileType::Brochure,
                file_id: "brochure_001".into(),
                builder_id: "builder_epsilon".into(),
                entity_id: "entity_epsilon".into(),
                description: "Marketing brochure for Builder Epsilon".into(),
            },
        ];

        // The built-in set is known to be duplicate-free.
        Self { cases }
    }

    /// Build a registry from explicit cases, rejecting duplicate `file_id`s.
    pub fn from_cases(cases: Vec<TestCase>) -> Result<Self, IntakeError> {
        for (index, case) in cases.iter().enumerate() {
            if cases[..index].iter().any(|c| c.file_id == case.file_id) {
                return Err(IntakeError::DuplicateCaseId(case.file_id.clone()));
            }
        }
        Ok(Self { cases })
    }

    /// Load a registry from a JSON file containing an array of cases.
    pub fn load_from_file(path: &Path) -> Result<Self, IntakeError> {
        let raw = fs::read_to_string(path).map_err(|err| IntakeError::Io {
            action: "read registry file",
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let cases: Vec<TestCase> = serde_json::from_str(&raw)?;
        Self::from_cases(cases)
    }

    /// All cases in declaration order.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Case identifiers in declaration order, used as execution labels.
    pub fn ids(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.file_id.as_str()).collect()
    }

    /// Look up a case by `file_id`.
    pub fn get(&self, file_id: &str) -> Result<&TestCase, IntakeError> {
        self.cases
            .iter()
            .find(|c| c.file_id == file_id)
            .ok_or_else(|| IntakeError::CaseNotFound(file_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
