//! The live SQL catalog the validator and compiler bind against. Modeled as
//! a trait object so the engine behind it is swappable without touching any
//! other component, in the same collaborator-boundary style as this
//! codebase's `cluster_adapter` trait.

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TabularResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("sql execution error: {0}")]
    Execution(String),
    #[error("table not found: {0}")]
    TableNotFound(String),
}

#[async_trait]
pub trait SqlCatalog: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, CatalogError>;
    async fn describe(&self, table: &str) -> Result<Vec<ColumnInfo>, CatalogError>;
    async fn query(&self, sql: &str) -> Result<TabularResult, CatalogError>;
}

/// An in-memory catalog backing tests and local development; holds no live
/// engine connection, so `query` always reports the table missing unless a
/// caller wires up rows directly for a fixture.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    pub tables: std::collections::HashMap<String, Vec<ColumnInfo>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<(&str, &str)>) -> Self {
        let columns = columns
            .into_iter()
            .map(|(n, t)| ColumnInfo { name: n.to_string(), column_type: t.to_string() })
            .collect();
        self.tables.insert(name.into(), columns);
        self
    }
}

#[async_trait]
impl SqlCatalog for StaticCatalog {
    async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn describe(&self, table: &str) -> Result<Vec<ColumnInfo>, CatalogError> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))
    }

    async fn query(&self, _sql: &str) -> Result<TabularResult, CatalogError> {
        Ok(TabularResult::default())
    }
}
