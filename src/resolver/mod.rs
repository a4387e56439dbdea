//! Concordance Resolver
//!
//! Two entry points, both read-only against the graph:
//!
//! | Entry point              | Traversal                                              |
//! |--------------------------|--------------------------------------------------------|
//! | `resolve_by_concept_id`  | node → canonical → every sibling → every identifier    |
//! | `resolve_by_authority`   | one lookup per registered representation of authority  |
//!
//! Each call issues its statements as a single batch, hands the rows to the
//! [`Assembler`] and returns `(records, found)`. Nothing is cached and nothing
//! is retried; a store failure surfaces as [`ConcordanceError::StoreUnavailable`].

pub mod queries;

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::assembler::{Assembler, AuthorityRef, RawRow};
use crate::authority::{AuthorityRegistry, Representation, UPP};
use crate::error::ConcordanceError;
use crate::model::Concordance;
use crate::store::{decode_rows, GraphQuery, GraphStore, Row, StoreError};

use queries::{IdentifierRow, LookupRow, MemberRow, UuidCountRow};

pub type Resolution = (Vec<Concordance>, bool);

pub struct ConcordanceResolver {
    store: Arc<dyn GraphStore>,
    registry: AuthorityRegistry,
    assembler: Assembler,
}

impl ConcordanceResolver {
    pub fn new(store: Arc<dyn GraphStore>, registry: AuthorityRegistry, env: &str) -> Self {
        Self {
            store,
            registry,
            assembler: Assembler::new(registry, env),
        }
    }

    /// Every identifier of every concept in the equivalence groups of `ids`.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn resolve_by_concept_id(
        &self,
        ids: &[Uuid],
    ) -> Result<Resolution, ConcordanceError> {
        if ids.is_empty() {
            return Ok((Vec::new(), false));
        }
        let uuids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let batch = [
            queries::uuid_counts(&uuids),
            queries::equivalence_walk(&uuids),
            queries::identifier_walk(&uuids),
        ];
        let [counts, members, identifiers] = self.run_batch(&batch).await?;
        check_unique_uuids(counts)?;

        let mut rows = Vec::new();
        for member in decode_rows::<MemberRow>(queries::EQUIVALENCE_WALK, members) {
            self.member_rows(member, &mut rows);
        }
        rows.extend(
            decode_rows::<IdentifierRow>(queries::IDENTIFIER_WALK, identifiers)
                .into_iter()
                .map(|i| RawRow {
                    uuid: Some(i.uuid),
                    canonical_uuid: i.canonical_uuid,
                    types: i.types,
                    authority: AuthorityRef::Labels(i.identifier_labels),
                    value: i.value,
                }),
        );

        let records = self.assembler.assemble(rows)?;
        let found = !records.is_empty();
        tracing::debug!(records = records.len(), "Resolved by concept id");
        Ok((records, found))
    }

    /// Concepts identified by `values` under `authority`. An unsupported
    /// authority is reported as not found.
    #[instrument(skip(self, values), fields(values = values.len()))]
    pub async fn resolve_by_authority(
        &self,
        authority: &str,
        values: &[String],
    ) -> Result<Resolution, ConcordanceError> {
        let Some(entry) = self.registry.entry(authority) else {
            tracing::debug!("Unsupported authority");
            return Ok((Vec::new(), false));
        };

        let mut values: Vec<String> = values
            .iter()
            .filter(|v| !v.is_empty())
            .cloned()
            .collect();
        values.sort();
        values.dedup();
        if values.is_empty() {
            return Ok((Vec::new(), false));
        }

        let mut batch: Vec<GraphQuery> = entry
            .representations
            .iter()
            .map(|rep| lookup_query(rep, &values))
            .collect();
        let lookups = batch.len();
        if entry.representations.contains(&Representation::DerivedFromUuid) {
            batch.push(queries::uuid_counts(&canonical_uuids(&values)));
        }

        let mut results = self.store.query_batch(&batch).await?;
        if results.len() != batch.len() {
            return Err(StoreError::Decode(format!(
                "expected {} result sets, got {}",
                batch.len(),
                results.len()
            ))
            .into());
        }
        for counts in results.drain(lookups..) {
            check_unique_uuids(counts)?;
        }

        let mut rows = Vec::new();
        for (query, result) in batch.iter().zip(results) {
            let decoded = decode_rows::<LookupRow>(query.name, result);
            rows.extend(decoded.into_iter().map(|r| RawRow {
                uuid: r.uuid,
                canonical_uuid: r.canonical_uuid,
                types: r.types,
                authority: AuthorityRef::Uri(entry.uri),
                value: r.value,
            }));
        }

        let records = self.assembler.assemble(rows)?;
        let found = !records.is_empty();
        tracing::debug!(records = records.len(), "Resolved by authority");
        Ok((records, found))
    }

    async fn run_batch<const N: usize>(
        &self,
        batch: &[GraphQuery; N],
    ) -> Result<[Vec<Row>; N], StoreError> {
        let results = self.store.query_batch(batch).await?;
        let received = results.len();
        results
            .try_into()
            .map_err(|_| StoreError::Decode(format!("expected {N} result sets, got {received}")))
    }

    // One member of a group carries its own authority identifier, its derived
    // UPP identifier and any identifiers stored on the canonical node.
    fn member_rows(&self, member: MemberRow, rows: &mut Vec<RawRow>) {
        let raw = |authority: AuthorityRef, value: String| RawRow {
            uuid: Some(member.uuid.clone()),
            canonical_uuid: member.canonical_uuid.clone(),
            types: member.types.clone(),
            authority,
            value,
        };

        if let (Some(authority), Some(value)) = (&member.authority, &member.authority_value) {
            rows.push(raw(AuthorityRef::Property(authority.clone()), value.clone()));
        }
        rows.push(raw(AuthorityRef::Uri(UPP), member.uuid.clone()));

        if let Some(properties) = &member.canonical_properties {
            for (property, uri) in self.registry.canonical_properties() {
                if let Some(value) = properties.get(property).and_then(|v| v.as_str()) {
                    rows.push(raw(AuthorityRef::Uri(uri), value.to_string()));
                }
            }
        }
    }
}

fn lookup_query(representation: &Representation, values: &[String]) -> GraphQuery {
    tracing::trace!(strategy = ?representation.strategy(), %representation, "Adding lookup");
    match representation {
        Representation::Property(property) => {
            queries::concepts_by_authority_property(property, values)
        }
        Representation::Label(label) => queries::identifiers_by_label(*label, values),
        Representation::CanonicalProperty(property) => {
            queries::canonicals_by_property(property, values)
        }
        Representation::DerivedFromUuid => queries::concepts_by_uuid(&canonical_uuids(values)),
    }
}

// Concept UUIDs are stored in hyphenated lower case. Values that are not
// UUIDs cannot name a concept and are left out.
fn canonical_uuids(values: &[String]) -> Vec<String> {
    let mut uuids: Vec<String> = values
        .iter()
        .filter_map(|v| Uuid::parse_str(v).ok())
        .map(|u| u.to_string())
        .collect();
    uuids.sort();
    uuids.dedup();
    uuids
}

fn check_unique_uuids(rows: Vec<Row>) -> Result<(), ConcordanceError> {
    match decode_rows::<UuidCountRow>(queries::UUID_COUNTS, rows)
        .into_iter()
        .find(|c| c.nodes > 1)
    {
        Some(duplicate) => Err(ConcordanceError::DataIntegrity(format!(
            "{} concept nodes share uuid {}",
            duplicate.nodes, duplicate.uuid
        ))),
        None => Ok(()),
    }
}
