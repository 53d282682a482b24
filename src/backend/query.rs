//! Query primitives for the data store: filters, ordering, limits.
//!
//! The shapes follow PostgREST's horizontal filtering (`col=eq.v`,
//! `col=in.(a,b)`, `order=col.desc`) so the REST adapter can encode them
//! directly and the in-memory store can evaluate them against JSON rows.

use serde_json::Value;

/// A single column predicate. Multiple filters are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::Eq(column.to_owned(), value.into())
    }

    pub fn is_in<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(column.to_owned(), values.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::In(c, _) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A select against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub collection: String,
    /// Column list; `None` selects everything.
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    #[must_use]
    pub fn from(collection: &str) -> Self {
        Self { collection: collection.to_owned(), columns: None, filters: Vec::new(), order: None, limit: None }
    }

    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| (*c).to_owned()).collect());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order { column: column.to_owned(), ascending: false });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Render a filter value the way PostgREST expects it in a query string.
pub(crate) fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

/// Encode a filter as a `(column, operator.value)` query pair.
pub(crate) fn encode_filter(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(column, value) => (column.clone(), format!("eq.{}", encode_value(value))),
        Filter::In(column, values) => {
            let list = values
                .iter()
                .map(|v| {
                    let raw = encode_value(v);
                    if raw.contains([',', '(', ')', '"']) {
                        format!("\"{}\"", raw.replace('"', "\\\""))
                    } else {
                        raw
                    }
                })
                .collect::<Vec<_>>()
                .join(",");
            (column.clone(), format!("in.({list})"))
        }
    }
}

/// Encode a full select as query pairs (without the collection path).
pub(crate) fn encode_select(select: &Select) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(select.filters.len() + 3);
    let columns = select
        .columns
        .as_ref()
        .map_or_else(|| "*".to_owned(), |cols| cols.join(","));
    pairs.push(("select".to_owned(), columns));
    pairs.extend(select.filters.iter().map(encode_filter));
    if let Some(order) = &select.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_owned(), format!("{}.{dir}", order.column)));
    }
    if let Some(limit) = select.limit {
        pairs.push(("limit".to_owned(), limit.to_string()));
    }
    pairs
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
