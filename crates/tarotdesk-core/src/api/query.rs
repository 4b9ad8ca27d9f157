//! Row selection for table requests.
//!
//! A `Query` holds equality filters, ordering and an optional limit. The REST
//! client renders it as a PostgREST query string; the in-memory backend
//! evaluates it directly against stored rows.

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single row by primary key
    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    /// Add an equality filter (`col=eq.value`)
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn asc(self, column: &str) -> Self {
        self.order(column, Direction::Asc)
    }

    pub fn desc(self, column: &str) -> Self {
        self.order(column, Direction::Desc)
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Render as a PostgREST query string, without the leading `?`.
    pub fn to_query_string(&self, select: bool) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        if select {
            out.append_pair("select", "*");
        }
        for filter in &self.filters {
            out.append_pair(&filter.column, &format!("eq.{}", filter.value));
        }
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, o.direction.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            out.append_pair("order", &order);
        }
        if let Some(limit) = self.limit {
            out.append_pair("limit", &limit.to_string());
        }
        out.finish()
    }

    // ===== In-process evaluation =====

    /// Check whether a row satisfies every filter
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| {
            row.get(&f.column)
                .map(|v| value_as_filter_text(v) == f.value)
                .unwrap_or(false)
        })
    }

    /// Filter, order and limit a set of rows
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut selected: Vec<Value> = rows.iter().filter(|r| self.matches(r)).cloned().collect();

        if !self.order.is_empty() {
            selected.sort_by(|a, b| {
                for o in &self.order {
                    let ord = compare_values(
                        a.get(&o.column).unwrap_or(&Value::Null),
                        b.get(&o.column).unwrap_or(&Value::Null),
                    );
                    let ord = match o.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Text form of a JSON value as it appears in an `eq.` filter
fn value_as_filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Compare two JSON values for ordering. Nulls sort first ascending.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string() {
        let q = Query::new()
            .eq("category", "general")
            .eq("card_number", 7)
            .asc("order_position")
            .limit(1);
        assert_eq!(
            q.to_query_string(true),
            "select=*&category=eq.general&card_number=eq.7&order=order_position.asc&limit=1"
        );
        assert_eq!(Query::by_id("abc").to_query_string(false), "id=eq.abc");
    }

    #[test]
    fn test_matches_non_string_values() {
        let row = json!({"id": "1", "card_number": 7, "is_current": true});
        assert!(Query::new().eq("card_number", 7).matches(&row));
        assert!(Query::new().eq("is_current", true).matches(&row));
        assert!(!Query::new().eq("is_current", false).matches(&row));
        assert!(!Query::new().eq("missing", "x").matches(&row));
    }

    #[test]
    fn test_apply_orders_and_limits() {
        let rows = vec![
            json!({"n": 3, "name": "c"}),
            json!({"n": 1, "name": "a"}),
            json!({"n": null, "name": "z"}),
            json!({"n": 2, "name": "b"}),
        ];
        let names: Vec<_> = Query::new()
            .desc("n")
            .limit(2)
            .apply(&rows)
            .iter()
            .map(|r| r["name"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["c", "b"]);

        let first = Query::new().asc("n").apply(&rows);
        assert_eq!(first[0]["name"], "z");
    }
}
