//! In-process graph store
//!
//! Holds a small concept graph in memory and answers the resolver's named
//! queries by evaluating them directly against it. Used by the test suites and
//! by `--graph-fixture` local runs, where the graph is loaded from YAML.
//!
//! Each query is evaluated with Cypher's matching rules: within one pattern a
//! relationship is matched at most once, while separate `MATCH` clauses may
//! traverse it again. The equivalence walk hops to the canonical node and back
//! out in two clauses, so the requested node is a member of its own group.
//!
//! ```yaml
//! concepts:
//!   - prefUUID: b20801ac-5a76-43cf-b816-8c3b2f7133ad
//!     labels: [Thing, Concept, Classification, Brand]
//!   - uuid: b20801ac-5a76-43cf-b816-8c3b2f7133ad
//!     labels: [Thing, Concept, Brand]
//!     authority: Smartlogic
//!     authorityValue: b20801ac-5a76-43cf-b816-8c3b2f7133ad
//!     equivalentTo: b20801ac-5a76-43cf-b816-8c3b2f7133ad
//! identifiers:
//!   - labels: [Identifier, FactsetIdentifier]
//!     value: 003JLG-E
//!     identifies: 5a5f8a11-8a57-3ef8-ab6f-4a54e6e3e6e0
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{GraphQuery, GraphStore, Row, StoreError};
use crate::resolver::queries;

pub const EXECUTED_LOG_LIMIT: usize = 256;

/// A concept node: either a leaf/legacy `Thing` (has `uuid`) or a canonical
/// node (has `prefUUID`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptNode {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default, rename = "prefUUID")]
    pub pref_uuid: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub authority_value: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// `prefUUID` of the canonical node this node is `EQUIVALENT_TO`.
    #[serde(default)]
    pub equivalent_to: Option<String>,
}

/// A legacy identifier node `IDENTIFIES`-linked to a thing by UUID.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierNode {
    pub labels: Vec<String>,
    pub value: String,
    pub identifies: String,
}

#[derive(Debug, Default, Deserialize)]
struct GraphFixture {
    #[serde(default)]
    concepts: Vec<ConceptNode>,
    #[serde(default)]
    identifiers: Vec<IdentifierNode>,
}

#[derive(Debug, Default)]
pub struct MemoryGraph {
    concepts: Vec<ConceptNode>,
    identifiers: Vec<IdentifierNode>,
    unavailable: AtomicBool,
    executed: Mutex<VecDeque<String>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let fixture: GraphFixture = serde_yaml::from_str(yaml)?;
        Ok(Self {
            concepts: fixture.concepts,
            identifiers: fixture.identifiers,
            ..Self::default()
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading graph fixture {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("parsing graph fixture {}", path.display()))
    }

    pub fn with_node(mut self, node: ConceptNode) -> Self {
        self.concepts.push(node);
        self
    }

    /// Canonical node of an equivalence group.
    pub fn canonical(self, pref_uuid: &str, labels: &[&str]) -> Self {
        self.canonical_with(pref_uuid, labels, &[])
    }

    /// Canonical node carrying direct properties such as `leiCode`.
    pub fn canonical_with(
        self,
        pref_uuid: &str,
        labels: &[&str],
        properties: &[(&str, &str)],
    ) -> Self {
        self.with_node(ConceptNode {
            pref_uuid: Some(pref_uuid.to_string()),
            labels: strings(labels),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect(),
            ..ConceptNode::default()
        })
    }

    /// Leaf concept tagged with an authority and attached to `canonical`.
    pub fn leaf(self, uuid: &str, authority: &str, value: &str, canonical: &str) -> Self {
        self.with_node(ConceptNode {
            uuid: Some(uuid.to_string()),
            labels: strings(&["Thing", "Concept"]),
            authority: Some(authority.to_string()),
            authority_value: Some(value.to_string()),
            equivalent_to: Some(canonical.to_string()),
            ..ConceptNode::default()
        })
    }

    /// Unconcorded legacy thing.
    pub fn thing(self, uuid: &str, labels: &[&str]) -> Self {
        self.with_node(ConceptNode {
            uuid: Some(uuid.to_string()),
            labels: strings(labels),
            ..ConceptNode::default()
        })
    }

    /// Legacy identifier node, e.g. `identifier("FactsetIdentifier", "003JLG-E", uuid)`.
    pub fn identifier(mut self, label: &str, value: &str, thing_uuid: &str) -> Self {
        self.identifiers.push(IdentifierNode {
            labels: strings(&["Identifier", label]),
            value: value.to_string(),
            identifies: thing_uuid.to_string(),
        });
        self
    }

    /// Make every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Names of the most recent queries executed, oldest first. Only the
    /// last [`EXECUTED_LOG_LIMIT`] names are kept.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory graph marked unavailable".into()));
        }
        Ok(())
    }

    fn things_with_uuid<'a>(
        &'a self,
        uuids: &'a [&'a str],
    ) -> impl Iterator<Item = &'a ConceptNode> {
        self.concepts
            .iter()
            .filter(move |n| n.uuid.as_deref().is_some_and(|u| uuids.contains(&u)))
    }

    fn canonical_of(&self, node: &ConceptNode) -> Option<&ConceptNode> {
        let pref = node.equivalent_to.as_deref()?;
        self.concepts
            .iter()
            .find(|n| n.pref_uuid.as_deref() == Some(pref))
    }

    // (member, canonical) pairs reachable from the requested uuids.
    fn walk<'a>(
        &'a self,
        uuids: &'a [&'a str],
    ) -> Vec<(&'a ConceptNode, Option<&'a ConceptNode>)> {
        let mut out = Vec::new();
        for p in self.things_with_uuid(uuids) {
            match self.canonical_of(p) {
                Some(canonical) => out.extend(
                    self.concepts
                        .iter()
                        .filter(|m| m.uuid.is_some() && m.equivalent_to == canonical.pref_uuid)
                        .map(|m| (m, Some(canonical))),
                ),
                None => out.push((p, None)),
            }
        }
        out
    }

    fn evaluate(&self, query: &GraphQuery) -> Result<Vec<Row>, StoreError> {
        let mut rows = Vec::new();
        match query.name {
            queries::UUID_COUNTS => {
                let uuids = query.list_param("uuids");
                for uuid in distinct(&uuids) {
                    let nodes = self.things_with_uuid(&[uuid]).count();
                    if nodes > 0 {
                        rows.push(row(json!({"uuid": uuid, "nodes": nodes})));
                    }
                }
            }
            queries::EQUIVALENCE_WALK => {
                let uuids = query.list_param("uuids");
                for (member, canonical) in self.walk(&uuids) {
                    rows.push(row(json!({
                        "uuid": member.uuid,
                        "canonicalUUID": canonical.and_then(|c| c.pref_uuid.clone()),
                        "types": types_of(member, canonical),
                        "authority": member.authority,
                        "authorityValue": member.authority_value,
                        "canonicalProperties": canonical
                            .map(|c| c.properties.clone())
                            .unwrap_or_default(),
                    })));
                }
            }
            queries::IDENTIFIER_WALK => {
                let uuids = query.list_param("uuids");
                for (member, canonical) in self.walk(&uuids) {
                    for identifier in self
                        .identifiers
                        .iter()
                        .filter(|i| member.uuid.as_deref() == Some(i.identifies.as_str()))
                    {
                        rows.push(row(json!({
                            "uuid": member.uuid,
                            "canonicalUUID": canonical.and_then(|c| c.pref_uuid.clone()),
                            "types": types_of(member, canonical),
                            "identifierLabels": identifier.labels,
                            "value": identifier.value,
                        })));
                    }
                }
            }
            queries::CONCEPTS_BY_UUID => {
                let values = query.list_param("values");
                for p in self.things_with_uuid(&values) {
                    rows.push(self.lookup_row(p, p.uuid.as_deref().unwrap_or_default()));
                }
            }
            queries::CONCEPTS_BY_AUTHORITY_PROPERTY => {
                let authority = query.str_param("authority");
                let values = query.list_param("values");
                for p in self.concepts.iter().filter(|n| {
                    n.uuid.is_some()
                        && n.authority.as_deref() == authority
                        && n.authority_value
                            .as_deref()
                            .is_some_and(|v| values.contains(&v))
                }) {
                    rows.push(self.lookup_row(p, p.authority_value.as_deref().unwrap_or_default()));
                }
            }
            queries::IDENTIFIERS_BY_LABEL => {
                let label = query.label.unwrap_or_default();
                let values = query.list_param("values");
                for identifier in self.identifiers.iter().filter(|i| {
                    i.labels.iter().any(|l| l == label) && values.contains(&i.value.as_str())
                }) {
                    for p in self.things_with_uuid(&[identifier.identifies.as_str()]) {
                        rows.push(self.lookup_row(p, &identifier.value));
                    }
                }
            }
            queries::CANONICALS_BY_PROPERTY => {
                let property = query.str_param("property").unwrap_or_default();
                let values = query.list_param("values");
                for canonical in self.concepts.iter().filter(|n| n.pref_uuid.is_some()) {
                    let value = canonical.properties.get(property).and_then(Value::as_str);
                    if let Some(value) = value {
                        if values.contains(&value) {
                            rows.push(row(json!({
                                "uuid": canonical.pref_uuid,
                                "canonicalUUID": canonical.pref_uuid,
                                "types": canonical.labels,
                                "value": value,
                            })));
                        }
                    }
                }
            }
            other => {
                return Err(StoreError::Query {
                    query: other.to_string(),
                    code: "Memory.UnknownQuery".into(),
                    message: "query not supported by the in-memory graph".into(),
                })
            }
        }

        // RETURN DISTINCT
        let mut unique: Vec<Row> = Vec::with_capacity(rows.len());
        for r in rows {
            if !unique.contains(&r) {
                unique.push(r);
            }
        }
        Ok(unique)
    }

    fn lookup_row(&self, p: &ConceptNode, value: &str) -> Row {
        let canonical = self.canonical_of(p);
        row(json!({
            "uuid": p.uuid,
            "canonicalUUID": canonical.and_then(|c| c.pref_uuid.clone()),
            "types": types_of(p, canonical),
            "value": value,
        }))
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn query_batch(&self, queries: &[GraphQuery]) -> Result<Vec<Vec<Row>>, StoreError> {
        self.ensure_available()?;
        if let Ok(mut executed) = self.executed.lock() {
            for query in queries {
                if executed.len() == EXECUTED_LOG_LIMIT {
                    executed.pop_front();
                }
                executed.push_back(query.name.to_string());
            }
        }
        queries.iter().map(|q| self.evaluate(q)).collect()
    }

    async fn check_connectivity(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn distinct<'a>(values: &[&'a str]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(v) {
            out.push(v);
        }
    }
    out
}

fn types_of<'a>(member: &'a ConceptNode, canonical: Option<&'a ConceptNode>) -> &'a [String] {
    canonical.map_or(&member.labels, |c| &c.labels)
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
