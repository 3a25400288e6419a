//! Model Index Builder
//!
//! Runs a single query against the model connection and produces the
//! model id → matching key table.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::canonical_key;
use crate::error::{MappingError, Result};

/// Query returning one row per building aspect in the model
pub const BUILDING_QUERY: &str =
    "select * from DgnCustomItemTypes_Building.Building__x0020__InformationElementAspect;";

/// Lazily produced query rows
pub type RowStream = BoxStream<'static, anyhow::Result<Value>>;

/// The model viewer's query channel
#[async_trait]
pub trait ModelConnection: Send + Sync {
    async fn query(&self, query: &str) -> anyhow::Result<RowStream>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementRef {
    pub id: String,
}

/// One building row as returned by the model query
#[derive(Debug, Clone, Deserialize)]
pub struct ModelRow {
    pub element: ElementRef,
    #[serde(rename = "building__number", alias = "building__x0020__Number")]
    pub building_number: String,
}

/// Model id → matching key, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelIndex {
    order: Vec<String>,
    keys: HashMap<String, String>,
}

impl ModelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the key of a model id. A replaced id keeps its
    /// original position.
    pub fn insert(&mut self, model_id: impl Into<String>, key: impl Into<String>) -> Option<String> {
        let model_id = model_id.into();
        let previous = self.keys.insert(model_id.clone(), key.into());
        if previous.is_none() {
            self.order.push(model_id);
        }
        previous
    }

    pub fn get(&self, model_id: &str) -> Option<&str> {
        self.keys.get(model_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(model_id, key)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.keys.get(id).map(|key| (id.as_str(), key.as_str())))
    }
}

impl<M: Into<String>, K: Into<String>> FromIterator<(M, K)> for ModelIndex {
    fn from_iter<I: IntoIterator<Item = (M, K)>>(iter: I) -> Self {
        let mut index = ModelIndex::new();
        for (model_id, key) in iter {
            index.insert(model_id, key);
        }
        index
    }
}

pub struct ModelIndexBuilder {
    query: String,
}

impl ModelIndexBuilder {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }

    /// Build the index. Nothing is returned unless every row was read.
    pub async fn build(&self, connection: &dyn ModelConnection) -> Result<ModelIndex> {
        debug!("Querying model: {}", self.query);

        let mut rows = connection
            .query(&self.query)
            .await
            .context("model query rejected")
            .map_err(MappingError::QueryChannel)?;

        let mut scratch = ModelIndex::new();
        while let Some(row) = rows.next().await {
            let row = row
                .context("model query stream failed")
                .map_err(MappingError::QueryChannel)?;
            let row: ModelRow = serde_json::from_value(row).map_err(MappingError::MalformedRow)?;

            let key = canonical_key(&row.building_number);
            if key.is_empty() {
                debug!(
                    "Model element {} has building number {:?} with an empty canonical key",
                    row.element.id, row.building_number
                );
            }
            scratch.insert(row.element.id, key);
        }

        info!("Model index built with {} buildings", scratch.len());
        Ok(scratch)
    }
}

impl Default for ModelIndexBuilder {
    fn default() -> Self {
        Self::new(BUILDING_QUERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;

    struct FixedConnection {
        rows: Vec<anyhow::Result<Value>>,
    }

    impl FixedConnection {
        fn ok(rows: Vec<Value>) -> Self {
            Self {
                rows: rows.into_iter().map(Ok).collect(),
            }
        }
    }

    #[async_trait]
    impl ModelConnection for FixedConnection {
        async fn query(&self, _query: &str) -> anyhow::Result<RowStream> {
            let rows: Vec<anyhow::Result<Value>> = self
                .rows
                .iter()
                .map(|r| match r {
                    Ok(v) => Ok(v.clone()),
                    Err(e) => Err(anyhow::anyhow!("{}", e)),
                })
                .collect();
            Ok(stream::iter(rows).boxed())
        }
    }

    struct RejectingConnection;

    #[async_trait]
    impl ModelConnection for RejectingConnection {
        async fn query(&self, _query: &str) -> anyhow::Result<RowStream> {
            anyhow::bail!("connection closed")
        }
    }

    #[tokio::test]
    async fn test_build_canonicalizes_keys() {
        let conn = FixedConnection::ok(vec![
            json!({"element": {"id": "0x1"}, "building__number": "0042"}),
            json!({"element": {"id": "0x2"}, "building__x0020__Number": "7"}),
            json!({"element": {"id": "0x3"}, "building__number": "000"}),
        ]);

        let index = ModelIndexBuilder::default().build(&conn).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("0x1"), Some("42"));
        assert_eq!(index.get("0x2"), Some("7"));
        assert_eq!(index.get("0x3"), Some(""));
        assert_eq!(index.get("0x4"), None);
    }

    #[tokio::test]
    async fn test_rejected_query_fails_build() {
        let err = ModelIndexBuilder::default()
            .build(&RejectingConnection)
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::QueryChannel(_)));
    }

    #[tokio::test]
    async fn test_stream_error_discards_partial_rows() {
        let conn = FixedConnection {
            rows: vec![
                Ok(json!({"element": {"id": "0x1"}, "building__number": "1"})),
                Err(anyhow::anyhow!("channel dropped")),
            ],
        };

        let result = ModelIndexBuilder::default().build(&conn).await;
        assert!(matches!(result, Err(MappingError::QueryChannel(_))));
    }

    #[tokio::test]
    async fn test_malformed_row() {
        let conn = FixedConnection::ok(vec![json!({"element": {}, "building__number": "1"})]);
        let result = ModelIndexBuilder::default().build(&conn).await;
        assert!(matches!(result, Err(MappingError::MalformedRow(_))));
    }

    #[test]
    fn test_index_keeps_first_position_on_replace() {
        let mut index = ModelIndex::new();
        index.insert("a", "1");
        index.insert("b", "2");
        assert_eq!(index.insert("a", "3"), Some("1".to_string()));

        let pairs: Vec<_> = index.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }
}
