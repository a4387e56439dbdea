//! Graph Store collaborator
//!
//! The resolver never talks to Neo4j directly. It hands parameterised Cypher
//! to a [`GraphStore`] and gets back rows keyed by column name. Two
//! implementations ship with the crate:
//!
//! - [`neo4j::Neo4jHttpStore`] - the Neo4j transactional HTTP endpoint
//! - [`memory::MemoryGraph`] - an in-process graph for tests and local runs

pub mod memory;
pub mod neo4j;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use memory::MemoryGraph;
pub use neo4j::Neo4jHttpStore;

/// One result row: column name -> value.
pub type Row = Map<String, Value>;

/// A named, parameterised Cypher statement.
///
/// The name is stable across releases and is what logs and test doubles key on.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    pub name: &'static str,
    pub statement: String,
    pub parameters: Map<String, Value>,
    /// Node label inlined into the statement, for queries that select by label.
    pub label: Option<&'static str>,
}

impl GraphQuery {
    pub fn new(name: &'static str, statement: impl Into<String>) -> Self {
        Self {
            name,
            statement: statement.into(),
            parameters: Map::new(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    pub fn list_param(&self, key: &str) -> Vec<&str> {
        self.parameters
            .get(key)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Errors raised by a graph store. All of them mean the store could not
/// answer; callers own any retry policy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("graph store unreachable: {0}")]
    Unavailable(String),

    #[error("query {query} failed: {code}: {message}")]
    Query {
        query: String,
        code: String,
        message: String,
    },

    #[error("unreadable graph store response: {0}")]
    Decode(String),
}

/// Synchronous request/response access to the equivalence graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run several statements in one round trip, returning one row set per
    /// statement in input order.
    async fn query_batch(&self, queries: &[GraphQuery]) -> Result<Vec<Vec<Row>>, StoreError>;

    async fn query(&self, query: &GraphQuery) -> Result<Vec<Row>, StoreError> {
        let mut results = self.query_batch(std::slice::from_ref(query)).await?;
        results
            .pop()
            .ok_or_else(|| StoreError::Decode(format!("no result set for {}", query.name)))
    }

    /// Cheap liveness probe.
    async fn check_connectivity(&self) -> Result<(), StoreError>;
}

/// Decode rows into `T`, dropping (and logging) rows that do not fit.
pub fn decode_rows<T: DeserializeOwned>(query: &str, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(Value::Object(row)) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(query, error = %e, "Dropping malformed row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        uuid: String,
    }

    #[test]
    fn decode_rows_skips_malformed_rows() {
        let rows = vec![
            json!({"uuid": "a"}).as_object().cloned().unwrap(),
            json!({"uuid": 7}).as_object().cloned().unwrap(),
            json!({"uuid": "b"}).as_object().cloned().unwrap(),
        ];
        let decoded: Vec<Sample> = decode_rows("test", rows);
        assert_eq!(
            decoded,
            vec![
                Sample { uuid: "a".into() },
                Sample { uuid: "b".into() }
            ]
        );
    }

    #[test]
    fn query_params() {
        let q = GraphQuery::new("q", "RETURN 1")
            .param("authority", "TME")
            .param("values", json!(["a", "b"]));
        assert_eq!(q.str_param("authority"), Some("TME"));
        assert_eq!(q.list_param("values"), vec!["a", "b"]);
        assert!(q.list_param("missing").is_empty());
    }
}
