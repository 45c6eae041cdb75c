use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of records returned by list/filter when no limit is given
pub const DEFAULT_LIMIT: usize = 100;

/// Canonical timestamp field used as the default sort key
pub const DEFAULT_ORDER_FIELD: &str = "created_at";

/// Query body accepted by `/api/find/:collection`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(default, rename = "where", alias = "where_clause")]
    pub where_clause: Option<Value>,
    #[serde(default, alias = "sort")]
    pub order: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One `field == value` condition after alias normalization
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

impl Default for FilterOrderInfo {
    /// Most-recent-first
    fn default() -> Self {
        Self {
            column: DEFAULT_ORDER_FIELD.to_string(),
            sort: SortDirection::Desc,
        }
    }
}

/// SQL text plus the JSONB parameters that follow the collection parameter (`$1`)
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
