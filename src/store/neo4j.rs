//! Neo4j transactional HTTP endpoint
//!
//! Statements are posted to `{base}/transaction/commit` in a single
//! auto-committed transaction. Each statement's `columns` and `data[].row`
//! arrays are zipped back into [`Row`] maps.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{GraphQuery, GraphStore, Row, StoreError};

const CONNECTIVITY_PROBE: &str = "MATCH (x) RETURN ID(x) LIMIT 1";

/// Graph store backed by Neo4j's REST API.
#[derive(Debug, Clone)]
pub struct Neo4jHttpStore {
    client: reqwest::Client,
    commit_url: String,
    batch_size: usize,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<DataRow>,
}

#[derive(Debug, Deserialize)]
struct DataRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    /// `base_url` is the legacy data root, e.g. `http://localhost:7474/db/data`.
    /// A `batch_size` of zero sends every statement of a batch in one request.
    pub fn new(base_url: &str, timeout: Duration, batch_size: usize) -> Result<Self, StoreError> {
        url::Url::parse(base_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid Neo4j URL {base_url}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(100)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            commit_url: format!("{}/transaction/commit", base_url.trim_end_matches('/')),
            batch_size,
        })
    }

    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }

    async fn commit(&self, queries: &[GraphQuery]) -> Result<Vec<Vec<Row>>, StoreError> {
        let body = CommitRequest {
            statements: queries
                .iter()
                .map(|q| Statement {
                    statement: &q.statement,
                    parameters: &q.parameters,
                    result_data_contents: ["row"],
                })
                .collect(),
        };

        let names: Vec<&str> = queries.iter().map(|q| q.name).collect();
        tracing::debug!(queries = ?names, "Executing cypher batch");

        let response = self
            .client
            .post(&self.commit_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let parsed: CommitResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        into_row_sets(queries, parsed)
    }
}

fn into_row_sets(
    queries: &[GraphQuery],
    response: CommitResponse,
) -> Result<Vec<Vec<Row>>, StoreError> {
    if let Some(err) = response.errors.into_iter().next() {
        return Err(StoreError::Query {
            query: queries
                .iter()
                .map(|q| q.name)
                .collect::<Vec<_>>()
                .join(","),
            code: err.code,
            message: err.message,
        });
    }

    if response.results.len() != queries.len() {
        return Err(StoreError::Decode(format!(
            "expected {} result sets, got {}",
            queries.len(),
            response.results.len()
        )));
    }

    Ok(response
        .results
        .into_iter()
        .map(|result| {
            result
                .data
                .into_iter()
                .map(|data| result.columns.iter().cloned().zip(data.row).collect())
                .collect()
        })
        .collect())
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn query_batch(&self, queries: &[GraphQuery]) -> Result<Vec<Vec<Row>>, StoreError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        let chunk = if self.batch_size == 0 {
            queries.len()
        } else {
            self.batch_size
        };

        let mut results = Vec::with_capacity(queries.len());
        for batch in queries.chunks(chunk) {
            results.extend(self.commit(batch).await?);
        }
        Ok(results)
    }

    async fn check_connectivity(&self) -> Result<(), StoreError> {
        let rows = self
            .query(&GraphQuery::new("connectivity_probe", CONNECTIVITY_PROBE))
            .await?;
        tracing::debug!(rows = rows.len(), "Connectivity probe returned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> CommitResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn zips_columns_and_rows() {
        let queries = vec![GraphQuery::new("a", "RETURN 1"), GraphQuery::new("b", "RETURN 2")];
        let response = parse(json!({
            "results": [
                {"columns": ["uuid", "types"], "data": [{"row": ["u1", ["Concept"]], "meta": []}]},
                {"columns": ["n"], "data": []}
            ],
            "errors": []
        }));

        let sets = into_row_sets(&queries, response).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0][0]["uuid"], json!("u1"));
        assert_eq!(sets[0][0]["types"], json!(["Concept"]));
        assert!(sets[1].is_empty());
    }

    #[test]
    fn neo4j_errors_become_query_errors() {
        let queries = vec![GraphQuery::new("broken", "RETURN")];
        let response = parse(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "bad"}]
        }));

        match into_row_sets(&queries, response) {
            Err(StoreError::Query { query, code, .. }) => {
                assert_eq!(query, "broken");
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError");
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_sets_are_decode_errors() {
        let queries = vec![GraphQuery::new("a", "RETURN 1")];
        let response = parse(json!({"results": [], "errors": []}));
        assert!(matches!(
            into_row_sets(&queries, response),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn commit_url_is_normalised() {
        let store =
            Neo4jHttpStore::new("http://localhost:7474/db/data/", Duration::from_secs(1), 0)
                .unwrap();
        assert_eq!(
            store.commit_url(),
            "http://localhost:7474/db/data/transaction/commit"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(Neo4jHttpStore::new("not a url", Duration::from_secs(1), 0).is_err());
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let store = Neo4jHttpStore::new("http://127.0.0.1:1/db/data", Duration::from_secs(2), 0)
            .unwrap();
        assert!(matches!(
            store.check_connectivity().await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
