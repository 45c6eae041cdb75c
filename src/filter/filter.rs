use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereInfo, SqlResult, DEFAULT_LIMIT};

/// A validated list/filter query against one collection.
///
/// The same value drives both backends: [`Filter::to_sql`] for Postgres and
/// [`Filter::matches`] / [`Filter::order_info`] for the in-memory store.
#[derive(Debug, Clone)]
pub struct Filter {
    collection: String,
    conditions: Vec<FilterWhereInfo>,
    order: FilterOrderInfo,
    limit: usize,
    max_limit: Option<usize>,
}

impl Filter {
    pub fn new(collection: impl Into<String>) -> Result<Self, FilterError> {
        let collection = collection.into();
        Self::validate_collection(&collection)?;
        Ok(Self {
            collection,
            conditions: vec![],
            order: FilterOrderInfo::default(),
            limit: DEFAULT_LIMIT,
            max_limit: None,
        })
    }

    /// Upper bound applied to every requested limit
    pub fn max_limit(mut self, max_limit: Option<usize>) -> Self {
        self.max_limit = max_limit;
        self.limit = self.capped(self.limit);
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(&where_clause)?; }
        if let Some(order) = data.order { self.order(&order)?; }
        if let Some(limit) = data.limit { self.limit(limit)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: &Value) -> Result<&mut Self, FilterError> {
        self.conditions = FilterWhere::validate_and_parse(conditions)?;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: &str) -> Result<&mut Self, FilterError> {
        self.order = FilterOrder::validate_and_parse(order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        let requested = usize::try_from(limit).unwrap_or(usize::MAX);
        self.limit = self.capped(requested);
        Ok(self)
    }

    fn capped(&self, requested: usize) -> usize {
        match self.max_limit {
            Some(max) if requested > max => {
                tracing::debug!("Limit {} exceeds max {}, capping to max", requested, max);
                max
            }
            _ => requested,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn order_info(&self) -> &FilterOrderInfo {
        &self.order
    }

    pub fn get_limit(&self) -> usize {
        self.limit
    }

    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        FilterWhere::matches(&self.conditions, doc)
    }

    /// `SELECT` over the shared documents table; `$1` is always the collection name
    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 1);

        let query = [
            "SELECT \"data\" FROM \"documents\"".to_string(),
            if where_clause.is_empty() {
                "WHERE \"collection\" = $1".to_string()
            } else {
                format!("WHERE \"collection\" = $1 AND {}", where_clause)
            },
            FilterOrder::generate(&self.order),
            format!("LIMIT {}", self.limit),
        ]
        .join(" ");

        SqlResult { query, params }
    }

    pub fn validate_collection(name: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(name) || name.len() > 63 {
            return Err(FilterError::InvalidCollection(name.to_string()));
        }
        Ok(())
    }

    pub fn validate_field(name: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(name) || name.len() > 128 {
            return Err(FilterError::InvalidField(name.to_string()));
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }
}
