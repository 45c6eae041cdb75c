use serde_json::{Map, Value};

use super::error::FilterError;
use super::field_alias::normalize_field;
use super::filter::Filter;
use super::types::FilterWhereInfo;

/// Equality-only WHERE handling. Conditions are a conjunction of `field == value`.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Parse `{ field: value, ... }` into normalized conditions.
    ///
    /// `{ field: { "$eq": value } }` is accepted as equality; every other
    /// `$` operator, including top-level `$and`/`$or`, is rejected.
    pub fn validate_and_parse(where_data: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(vec![]),
            Value::Object(obj) => obj,
            _ => {
                return Err(FilterError::InvalidWhereClause(
                    "where must be an object of field/value pairs".to_string(),
                ))
            }
        };

        let mut conditions = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            if key.starts_with('$') {
                return Err(FilterError::UnsupportedOperator(key.clone()));
            }
            let column = normalize_field(key);
            Filter::validate_field(column)?;
            let data = Self::equality_operand(value)?;
            conditions.push(FilterWhereInfo { column: column.to_string(), data });
        }

        // Two legacy spellings of one field would otherwise produce two conditions
        conditions.sort_by(|a, b| a.column.cmp(&b.column));
        if let Some(pair) = conditions.windows(2).find(|w| w[0].column == w[1].column) {
            if !json_eq(&pair[0].data, &pair[1].data) {
                return Err(FilterError::InvalidWhereClause(format!(
                    "conflicting values for field '{}'",
                    pair[0].column
                )));
            }
        }
        conditions.dedup_by(|a, b| a.column == b.column);
        Ok(conditions)
    }

    fn equality_operand(value: &Value) -> Result<Value, FilterError> {
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
                if obj.len() == 1 {
                    if let Some(eq) = obj.get("$eq") {
                        return Ok(eq.clone());
                    }
                }
                let op = obj.keys().find(|k| k.starts_with('$')).cloned().unwrap_or_default();
                Err(FilterError::UnsupportedOperator(op))
            }
            other => Ok(other.clone()),
        }
    }

    /// Build the SQL predicate over the `data` JSONB column
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        let clauses: Vec<String> = conditions
            .iter()
            .map(|c| format!("\"data\" -> '{}' = {}", c.column, filter_where.param(c.data.clone())))
            .collect();
        (clauses.join(" AND "), filter_where.param_values)
    }

    /// Evaluate the conditions against an in-memory document
    pub fn matches(conditions: &[FilterWhereInfo], doc: &Map<String, Value>) -> bool {
        conditions
            .iter()
            .all(|c| doc.get(&c.column).is_some_and(|v| json_eq(v, &c.data)))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}::jsonb", self.param_index)
    }
}

/// JSON equality with numeric comparison by value (`1 == 1.0`), as JSONB does
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}
