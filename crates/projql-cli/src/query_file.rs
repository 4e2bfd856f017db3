//! Query files: a runtime shape plus filters, ordering and paging.
//!
//! ```json
//! {
//!   "name": "CustomerCities",
//!   "entity": "Customer",
//!   "fields": [
//!     { "output_name": "name", "source_path": "name" },
//!     { "output_name": "city", "source_path": "a.city" }
//!   ],
//!   "joins": [{ "path": "address", "alias": "a", "kind": "LEFT" }],
//!   "filters": [{ "Leaf": { "path": "age", "operator": "GREATER_THAN", "value": { "Scalar": { "Int32": 5 } } } }],
//!   "order": [{ "path": "name", "direction": "ASC" }],
//!   "paging": { "first": 0, "size": 10 }
//! }
//! ```

use std::path::Path;

use projql_core::{JoinDeclaration, ProjectionQuery, Row, SelectionField, ShapeKind, ShapeMetadata};
use projql_proto::{FilterExpr, OrderSpec, Pagination};
use serde::Deserialize;

use crate::error::{CliError, Result};

/// A projection query described in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryFile {
    /// Shape name used in diagnostics.
    #[serde(default = "default_name")]
    pub name: String,
    /// Source entity.
    pub entity: String,
    /// Output columns.
    pub fields: Vec<SelectionField>,
    #[serde(default)]
    pub joins: Vec<JoinDeclaration>,
    /// Filters, combined with AND.
    #[serde(default)]
    pub filters: Vec<FilterExpr>,
    #[serde(default)]
    pub order: Vec<OrderSpec>,
    #[serde(default)]
    pub paging: Option<Pagination>,
    #[serde(default)]
    pub distinct: bool,
}

fn default_name() -> String {
    "query".to_string()
}

impl QueryFile {
    /// Read and parse a query file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::QueryFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Output column names in selection order.
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.output_name.clone()).collect()
    }

    /// Build a row-valued projection query.
    pub fn to_query(&self) -> ProjectionQuery<Row> {
        let metadata = ShapeMetadata {
            name: self.name.clone(),
            entity: self.entity.clone(),
            kind: ShapeKind::Fields,
            fields: self.fields.clone(),
            joins: self.joins.clone(),
        };

        let mut query = ProjectionQuery::with_shape(Row::shape(metadata)).distinct(self.distinct);
        for filter in &self.filters {
            query = query.filter_expr(filter.clone());
        }
        for order in &self.order {
            query = query.order_by(order.clone());
        }
        if let Some(paging) = self.paging {
            query = query.pagination(paging);
        }
        query
    }
}
