//! Parameterized Cypher queries and the seam every read goes through.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use cloudatlas_core::{QueryResult, RiskLevel};

use crate::client::GraphError;

/// A normalized result row: column name → plain JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Int(i64),
    Str(String),
    StrList(Vec<String>),
}

impl QueryParam {
    pub fn str_list(items: &[&str]) -> Self {
        Self::StrList(items.iter().map(|s| s.to_string()).collect())
    }
}

/// A Cypher query with its bound parameters and the columns it returns.
///
/// Columns are declared up front so rows can be normalized by name without
/// inspecting driver-specific row metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    pub text: String,
    pub params: Vec<(String, QueryParam)>,
    pub columns: Vec<&'static str>,
}

impl CypherQuery {
    pub fn new(text: impl Into<String>, columns: &[&'static str]) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
            columns: columns.to_vec(),
        }
    }

    pub fn param(mut self, key: &str, value: QueryParam) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn param_value(&self, key: &str) -> Option<&QueryParam> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Build the driver query.
    pub fn to_neo4rs(&self) -> neo4rs::Query {
        self.params
            .iter()
            .fold(neo4rs::query(&self.text), |q, (key, value)| match value {
                QueryParam::Int(i) => q.param(key, *i),
                QueryParam::Str(s) => q.param(key, s.clone()),
                QueryParam::StrList(items) => q.param(key, items.clone()),
            })
    }
}

/// Anything that can run a read query and hand back normalized rows.
///
/// Implemented by [`crate::GraphClient`] (an established connection) and
/// [`crate::GraphHandle`] (connects on first use).
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn fetch_records(&self, query: &CypherQuery) -> Result<Vec<Record>, GraphError>;

    /// Verify connectivity by counting every node in the graph.
    async fn check_connection(&self) -> Result<i64, GraphError> {
        let query = CypherQuery::new("MATCH (n) RETURN count(n) AS cnt", &["cnt"]);
        let records = self.fetch_records(&query).await?;
        Ok(records
            .first()
            .and_then(|r| r.get("cnt"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0))
    }
}

/// Run a query and wrap its rows, deserialized as `T`, in the uniform envelope.
pub async fn execute_query<T, R>(
    runner: &R,
    query: &CypherQuery,
    summary: &str,
    risk_level: Option<RiskLevel>,
) -> Result<QueryResult<T>, GraphError>
where
    T: DeserializeOwned,
    R: QueryRunner + ?Sized,
{
    let records = runner.fetch_records(query).await?;
    let data = records
        .into_iter()
        .map(|record| {
            serde_json::from_value(serde_json::Value::Object(record))
                .map_err(|e| GraphError::Serialization(format!("Failed to decode row: {e}")))
        })
        .collect::<Result<Vec<T>, _>>()?;

    tracing::debug!(rows = data.len(), summary, "Query completed");
    Ok(QueryResult::new(summary, data, risk_level))
}
