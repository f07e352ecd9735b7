#![allow(dead_code)]
//! # Payload Builder
//!
//! Pure construction of the query-parameter mapping attached to one intake
//! request, either from a registered test case or from caller-supplied
//! values. No encoding happens here; percent-encoding is the HTTP layer's
//! job.

use crate::cases::{Registry, TestCase};
use crate::error::IntakeError;

/// The fixed key set of an intake request.
pub const QUERY_KEYS: [&str; 5] = ["file_url", "file_type", "file_id", "builder_id", "entity_id"];

/// Flat key/value mapping for one outbound request, in insertion order.
///
/// Built fresh per invocation and discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    fn push(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_string(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// One-line `key=value` rendering for request logs.
    pub fn summary(&self) -> String {
        let rendered: Vec<String> = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        rendered.join("&")
    }
}

/// Build the query parameters for a registered case, looked up by `file_id`.
///
/// The five fields are copied verbatim from the matching [`TestCase`].
pub fn for_case_id(registry: &Registry, file_id: &str) -> Result<QueryParams, IntakeError> {
    Ok(from_case(registry.get(file_id)?))
}

/// Build the query parameters directly from a test case.
pub fn from_case(case: &TestCase) -> QueryParams {
    let mut params = QueryParams::default();
    params.push("file_url", case.file_url.clone());
    params.push("file_type", case.file_type.as_str());
    params.push("file_id", case.file_id.clone());
    params.push("builder_id", case.builder_id.clone());
    params.push("entity_id", case.entity_id.clone());
    params
}

/// Caller-assembled payload for negative and ad-hoc requests.
///
/// Each field is optional so a test can deliberately leave one out: an unset
/// field is absent from the built mapping entirely, while a field set to an
/// empty string is carried through as an empty-valued parameter.
#[derive(Debug, Clone, Default)]
pub struct CustomPayload {
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub file_id: Option<String>,
    pub builder_id: Option<String>,
    pub entity_id: Option<String>,
}

impl CustomPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_url(mut self, value: impl Into<String>) -> Self {
        self.file_url = Some(value.into());
        self
    }

    pub fn file_type(mut self, value: impl Into<String>) -> Self {
        self.file_type = Some(value.into());
        self
    }

    pub fn file_id(mut self, value: impl Into<String>) -> Self {
        self.file_id = Some(value.into());
        self
    }

    pub fn builder_id(mut self, value: impl Into<String>) -> Self {
        self.builder_id = Some(value.into());
        self
    }

    pub fn entity_id(mut self, value: impl Into<String>) -> Self {
        self.entity_id = Some(value.into());
        self
    }

    /// Build the mapping, omitting unset fields.
    pub fn build(&self) -> QueryParams {
        let mut params = QueryParams::default();
        for (key, value) in self.fields() {
            if let Some(value) = value {
                params.push(key, value.clone());
            }
        }
        params
    }

    /// Build the mapping, failing on the first unset field.
    pub fn build_strict(&self) -> Result<QueryParams, IntakeError> {
        for (key, value) in self.fields() {
            if value.is_none() {
                return Err(IntakeError::MissingField(key));
            }
        }
        Ok(self.build())
    }

    fn fields(&self) -> [(&'static str, &Option<String>); 5] {
        [
            ("file_url", &self.file_url),
            ("file_type", &self.file_type),
            ("file_id", &self.file_id),
            ("builder_id", &self.builder_id),
            ("entity_id", &self.entity_id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::Registry;

    fn full_payload() -> CustomPayload {
        CustomPayload::new()
            .file_url("https://example.com/test.pdf")
            .file_type("community")
            .file_id("test_001")
            .builder_id("test_builder")
            .entity_id("test_entity")
    }

    #[test]
    fn for_case_id_round_trips_all_five_fields() {
        let registry = Registry::builtin();
        let params = for_case_id(&registry, "community_001").unwrap();

        assert_eq!(
            params.get("file_url"),
            Some("https://example.com/community-guide.pdf")
        );
        assert_eq!(params.get("file_type"), Some("community"));
        assert_eq!(params.get("file_id"), Some("community_001"));
        assert_eq!(params.get("builder_id"), Some("builder_alpha"));
        assert_eq!(params.get("entity_id"), Some("entity_alpha"));
        assert_eq!(params.len(), QUERY_KEYS.len());
    }

    #[test]
    fn for_case_id_matches_case_fields_for_every_entry() {
        let registry = Registry::builtin();
        for case in registry.cases() {
            let params = for_case_id(&registry, &case.file_id).unwrap();
            assert_eq!(params.get("file_url"), Some(case.file_url.as_str()));
            assert_eq!(params.get("file_type"), Some(case.file_type.as_str()));
            assert_eq!(params.get("file_id"), Some(case.file_id.as_str()));
            assert_eq!(params.get("builder_id"), Some(case.builder_id.as_str()));
            assert_eq!(params.get("entity_id"), Some(case.entity_id.as_str()));
        }
    }

    #[test]
    fn for_case_id_unknown_id_is_not_found() {
        let registry = Registry::builtin();
        let err = for_case_id(&registry, "nope_001").unwrap_err();
        assert!(matches!(err, IntakeError::CaseNotFound(_)));
    }

    #[test]
    fn custom_build_is_idempotent() {
        let payload = full_payload();
        assert_eq!(payload.build(), payload.build());
    }

    #[test]
    fn custom_build_omits_unset_fields() {
        let mut payload = full_payload();
        payload.file_url = None;
        let params = payload.build();

        assert!(!params.contains("file_url"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn custom_build_keeps_empty_string_fields() {
        let params = full_payload().file_url("").build();
        assert_eq!(params.get("file_url"), Some(""));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn strict_build_flags_the_missing_field() {
        let mut payload = full_payload();
        payload.builder_id = None;
        let err = payload.build_strict().unwrap_err();
        assert!(matches!(err, IntakeError::MissingField("builder_id")));
    }

    #[test]
    fn strict_build_accepts_complete_payloads() {
        let params = full_payload().build_strict().unwrap();
        for key in QUERY_KEYS {
            assert!(params.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn summary_joins_pairs_in_order() {
        let params = CustomPayload::new()
            .file_id("a")
            .builder_id("b")
            .build();
        assert_eq!(params.summary(), "file_id=a&builder_id=b");
    }
}
