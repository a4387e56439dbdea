//! Result Assembler
//!
//! Turns raw resolver rows into [`Concordance`] records:
//!
//! ```text
//! RawRow { uuid, canonical_uuid, types, authority, value }
//!     │  authority  ── registry ──▶ authority URI        (unresolved: dropped)
//!     │  canonical_uuid or uuid ──▶ concept id           (neither: dropped)
//!     │  (id, types, env) ────────▶ apiUrl               (unmapped: TypeMapping)
//!     ▼
//! dedup on (authority, value), group identity preferred ──▶ sorted records
//! ```

pub mod api_url;

use std::collections::HashMap;

use crate::authority::AuthorityRegistry;
use crate::error::ConcordanceError;
use crate::model::{Concept, Concordance, Identifier, THING_URI_PREFIX};

pub use api_url::ApiUrls;

/// Authority of a row, in whichever form the graph stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityRef {
    /// Modern `authority` property value, e.g. `TME`.
    Property(String),
    /// Label set of a legacy identifier node.
    Labels(Vec<String>),
    /// Already an authority URI.
    Uri(&'static str),
}

/// One identifier reached by a traversal, before canonicalisation.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub uuid: Option<String>,
    pub canonical_uuid: Option<String>,
    pub types: Vec<String>,
    pub authority: AuthorityRef,
    pub value: String,
}

struct Candidate {
    record: Concordance,
    from_group: bool,
}

#[derive(Debug, Clone)]
pub struct Assembler {
    registry: AuthorityRegistry,
    urls: ApiUrls,
}

impl Assembler {
    pub fn new(registry: AuthorityRegistry, env: &str) -> Self {
        Self {
            registry,
            urls: ApiUrls::for_env(env),
        }
    }

    fn authority_uri(&self, authority: &AuthorityRef) -> Option<&'static str> {
        match authority {
            AuthorityRef::Property(p) => self.registry.from_property(p),
            AuthorityRef::Labels(labels) => self.registry.from_labels(labels),
            AuthorityRef::Uri(uri) => self.registry.entry(uri).map(|e| e.uri),
        }
    }

    /// Build the deduplicated record set for a batch of rows.
    ///
    /// Rows with an unknown authority, no value or no concept identity are
    /// dropped and logged. A concept whose types do not map to an API route
    /// fails the batch.
    pub fn assemble(&self, rows: Vec<RawRow>) -> Result<Vec<Concordance>, ConcordanceError> {
        let mut by_identifier: HashMap<Identifier, Candidate> = HashMap::new();

        for row in rows {
            let Some(authority) = self.authority_uri(&row.authority) else {
                tracing::warn!(
                    authority = ?row.authority,
                    value = %row.value,
                    "Dropping row with unresolvable authority"
                );
                continue;
            };
            if row.value.is_empty() {
                tracing::warn!(authority, "Dropping row with empty identifier value");
                continue;
            }

            let identity = (non_empty(&row.canonical_uuid), non_empty(&row.uuid));
            let (concept_uuid, from_group) = match identity {
                (Some(canonical), _) => (canonical, true),
                (None, Some(own)) => (own, false),
                (None, None) => {
                    tracing::warn!(
                        authority,
                        value = %row.value,
                        "Dropping row without concept identity"
                    );
                    continue;
                }
            };

            let api_url = self.urls.api_url(concept_uuid, &row.types).ok_or_else(|| {
                ConcordanceError::TypeMapping {
                    uuid: concept_uuid.to_string(),
                    types: row.types.clone(),
                }
            })?;

            let identifier = Identifier {
                authority: authority.to_string(),
                identifier_value: row.value.clone(),
            };
            let candidate = Candidate {
                record: Concordance {
                    concept: Concept {
                        id: format!("{THING_URI_PREFIX}{concept_uuid}"),
                        api_url,
                    },
                    identifier: identifier.clone(),
                },
                from_group,
            };

            match by_identifier.get(&identifier) {
                None => {
                    by_identifier.insert(identifier, candidate);
                }
                Some(existing) => {
                    if let Some(winner) = merge(existing, candidate)? {
                        by_identifier.insert(identifier, winner);
                    }
                }
            }
        }

        let mut records: Vec<Concordance> = by_identifier.into_values().map(|c| c.record).collect();
        records.sort();
        Ok(records)
    }
}

// Decide between two records for one identifier. `Some` replaces the existing
// record, `None` keeps it.
fn merge(existing: &Candidate, incoming: Candidate) -> Result<Option<Candidate>, ConcordanceError> {
    if existing.record.concept.id == incoming.record.concept.id {
        return Ok(None);
    }
    match (existing.from_group, incoming.from_group) {
        (true, true) => Err(ConcordanceError::DataIntegrity(format!(
            "identifier {} {} belongs to concepts {} and {}",
            incoming.record.identifier.authority,
            incoming.record.identifier.identifier_value,
            existing.record.concept.id,
            incoming.record.concept.id,
        ))),
        (true, false) => Ok(None),
        (false, true) => Ok(Some(incoming)),
        (false, false) => {
            tracing::warn!(
                authority = %incoming.record.identifier.authority,
                value = %incoming.record.identifier.identifier_value,
                "Identifier attached to more than one legacy concept"
            );
            Ok((incoming.record.concept.id < existing.record.concept.id).then_some(incoming))
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{FACTSET, SMARTLOGIC, TME, UPP};

    fn assembler() -> Assembler {
        Assembler::new(AuthorityRegistry::new(), "prod")
    }

    fn row(
        uuid: Option<&str>,
        canonical: Option<&str>,
        authority: AuthorityRef,
        value: &str,
    ) -> RawRow {
        RawRow {
            uuid: uuid.map(str::to_string),
            canonical_uuid: canonical.map(str::to_string),
            types: vec!["Thing".into(), "Concept".into(), "Organisation".into()],
            authority,
            value: value.into(),
        }
    }

    #[test]
    fn canonical_uuid_is_preferred() {
        let records = assembler()
            .assemble(vec![row(
                Some("legacy"),
                Some("group"),
                AuthorityRef::Property("FACTSET".into()),
                "003JLG-E",
            )])
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].concept.id, "http://api.ft.com/things/group");
        assert_eq!(records[0].concept.api_url, "http://api.ft.com/organisations/group");
        assert_eq!(records[0].identifier.authority, FACTSET);
    }

    #[test]
    fn empty_canonical_falls_back_to_own_uuid() {
        let records = assembler()
            .assemble(vec![row(
                Some("legacy"),
                Some(""),
                AuthorityRef::Labels(vec!["Identifier".into(), "TMEIdentifier".into()]),
                "VGhl",
            )])
            .unwrap();
        assert_eq!(records[0].concept.id, "http://api.ft.com/things/legacy");
        assert_eq!(records[0].identifier.authority, TME);
    }

    #[test]
    fn duplicate_paths_collapse_to_one_record() {
        let records = assembler()
            .assemble(vec![
                row(Some("a"), Some("g"), AuthorityRef::Uri(UPP), "a"),
                row(Some("a"), Some("g"), AuthorityRef::Labels(vec!["UPPIdentifier".into()]), "a"),
                row(Some("a"), Some("g"), AuthorityRef::Uri(UPP), "a"),
            ])
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn group_record_beats_legacy_record() {
        for rows in [
            vec![
                row(Some("old"), None, AuthorityRef::Property("Smartlogic".into()), "s"),
                row(Some("new"), Some("g"), AuthorityRef::Property("Smartlogic".into()), "s"),
            ],
            vec![
                row(Some("new"), Some("g"), AuthorityRef::Property("Smartlogic".into()), "s"),
                row(Some("old"), None, AuthorityRef::Property("Smartlogic".into()), "s"),
            ],
        ] {
            let records = assembler().assemble(rows).unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].concept.id, "http://api.ft.com/things/g");
            assert_eq!(records[0].identifier.authority, SMARTLOGIC);
        }
    }

    #[test]
    fn conflicting_groups_are_an_integrity_error() {
        let err = assembler()
            .assemble(vec![
                row(None, Some("g1"), AuthorityRef::Uri(FACTSET), "x"),
                row(None, Some("g2"), AuthorityRef::Uri(FACTSET), "x"),
            ])
            .unwrap_err();
        assert!(matches!(err, ConcordanceError::DataIntegrity(_)));
    }

    #[test]
    fn unresolvable_rows_are_dropped() {
        let records = assembler()
            .assemble(vec![
                row(Some("a"), None, AuthorityRef::Property("Unknown".into()), "x"),
                row(Some("a"), None, AuthorityRef::Labels(vec!["Identifier".into()]), "y"),
                row(Some("a"), None, AuthorityRef::Uri("http://api.ft.com/system/Nope"), "z"),
                row(None, None, AuthorityRef::Uri(UPP), "v"),
                row(Some("a"), None, AuthorityRef::Uri(UPP), ""),
                row(Some("a"), None, AuthorityRef::Uri(UPP), "a"),
            ])
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier.identifier_value, "a");
    }

    #[test]
    fn unmapped_types_are_a_defect() {
        let mut bad = row(Some("a"), None, AuthorityRef::Uri(UPP), "a");
        bad.types = vec!["Person".into(), "Organisation".into()];
        let err = assembler().assemble(vec![bad]).unwrap_err();
        assert!(matches!(err, ConcordanceError::TypeMapping { uuid, .. } if uuid == "a"));
    }

    #[test]
    fn output_is_sorted() {
        let records = assembler()
            .assemble(vec![
                row(Some("b"), None, AuthorityRef::Uri(UPP), "b"),
                row(Some("a"), None, AuthorityRef::Uri(UPP), "a"),
            ])
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.concept.id.as_str()).collect();
        assert_eq!(ids, ["http://api.ft.com/things/a", "http://api.ft.com/things/b"]);
    }
}
