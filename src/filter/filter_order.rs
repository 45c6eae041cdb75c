use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::field_alias::normalize_field;
use super::filter::Filter;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse an order spec: `"-created_date"`, `"name"`, `"+name"` or `"name desc"`.
    /// An empty spec yields the default most-recent-first order.
    pub fn validate_and_parse(spec: &str) -> Result<FilterOrderInfo, FilterError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Ok(FilterOrderInfo::default());
        }

        let mut parts = trimmed.split_whitespace();
        let head = parts.next().unwrap_or_default();
        let (field, mut sort) = match head.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (head.strip_prefix('+').unwrap_or(head), SortDirection::Asc),
        };

        if let Some(dir) = parts.next() {
            sort = match dir.to_ascii_lowercase().as_str() {
                "desc" => SortDirection::Desc,
                "asc" => SortDirection::Asc,
                other => return Err(FilterError::InvalidOrder(format!("unknown direction '{}'", other))),
            };
        }
        if parts.next().is_some() {
            return Err(FilterError::InvalidOrder(format!("expected a single field, got '{}'", trimmed)));
        }

        let column = normalize_field(field);
        Filter::validate_field(column)?;
        Ok(FilterOrderInfo { column: column.to_string(), sort })
    }

    /// Documents missing the field sort last in both directions; `id` breaks ties
    pub fn generate(info: &FilterOrderInfo) -> String {
        format!(
            "ORDER BY \"data\" -> '{}' {} NULLS LAST, \"id\" ASC",
            info.column,
            info.sort.to_sql()
        )
    }

    /// In-memory equivalent of [`FilterOrder::generate`]
    pub fn compare(info: &FilterOrderInfo, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare_json(x, y);
                match info.sort {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }
        }
    }
}

// JSONB ordering: Object > Array > Boolean > Number > String > Null
fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => xs.len().cmp(&ys.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_prefix_forms() {
        assert_eq!(
            FilterOrder::validate_and_parse("-created_date").unwrap(),
            FilterOrderInfo { column: "created_at".into(), sort: SortDirection::Desc }
        );
        assert_eq!(
            FilterOrder::validate_and_parse("name").unwrap(),
            FilterOrderInfo { column: "name".into(), sort: SortDirection::Asc }
        );
        assert_eq!(
            FilterOrder::validate_and_parse("+name").unwrap().sort,
            SortDirection::Asc
        );
    }

    #[test]
    fn parses_direction_word() {
        let info = FilterOrder::validate_and_parse("updatedAt DESC").unwrap();
        assert_eq!(info.column, "updated_at");
        assert_eq!(info.sort, SortDirection::Desc);
        assert!(FilterOrder::validate_and_parse("name sideways").is_err());
        assert!(FilterOrder::validate_and_parse("a b c").is_err());
    }

    #[test]
    fn empty_spec_is_most_recent_first() {
        assert_eq!(FilterOrder::validate_and_parse("  ").unwrap(), FilterOrderInfo::default());
    }

    #[test]
    fn generates_order_clause() {
        let info = FilterOrder::validate_and_parse("-due_date").unwrap();
        assert_eq!(
            FilterOrder::generate(&info),
            "ORDER BY \"data\" -> 'due_date' DESC NULLS LAST, \"id\" ASC"
        );
    }

    #[test]
    fn missing_values_sort_last_both_ways() {
        let asc = FilterOrderInfo { column: "n".into(), sort: SortDirection::Asc };
        let desc = FilterOrderInfo { column: "n".into(), sort: SortDirection::Desc };
        let one = json!(1);
        assert_eq!(FilterOrder::compare(&asc, None, Some(&one)), Ordering::Greater);
        assert_eq!(FilterOrder::compare(&desc, None, Some(&one)), Ordering::Greater);
    }

    #[test]
    fn compares_like_jsonb() {
        let asc = FilterOrderInfo { column: "n".into(), sort: SortDirection::Asc };
        assert_eq!(FilterOrder::compare(&asc, Some(&json!(2)), Some(&json!(10.5))), Ordering::Less);
        assert_eq!(FilterOrder::compare(&asc, Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(FilterOrder::compare(&asc, Some(&json!("z")), Some(&json!(1))), Ordering::Less);
    }
}
