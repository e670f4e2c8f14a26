//! Appwrite JSON query objects
//!
//! Every list call takes a slice of [`Query`] values. They are serialized to
//! the JSON form Appwrite expects in the repeated `queries[]` parameter,
//! e.g. `{"method":"equal","attribute":"role","values":["teacher"]}`.

use serde_json::{Value, json};

/// Built-in attribute holding the creation timestamp of every document
pub const CREATED_AT: &str = "$createdAt";

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, Vec<Value>),
    Search(String, String),
    OrderAsc(String),
    OrderDesc(String),
    Limit(u64),
    Offset(u64),
    Select(Vec<String>),
    Or(Vec<Query>),
}

impl Query {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::Equal(attribute.to_string(), vec![value.into()])
    }

    pub fn search(attribute: &str, term: &str) -> Self {
        Query::Search(attribute.to_string(), term.to_string())
    }

    pub fn order_asc(attribute: &str) -> Self {
        Query::OrderAsc(attribute.to_string())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc(attribute.to_string())
    }

    pub fn limit(limit: u64) -> Self {
        Query::Limit(limit)
    }

    pub fn offset(offset: u64) -> Self {
        Query::Offset(offset)
    }

    pub fn select(attributes: &[&str]) -> Self {
        Query::Select(attributes.iter().map(|a| a.to_string()).collect())
    }

    pub fn or(queries: Vec<Query>) -> Self {
        Query::Or(queries)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Query::Equal(attribute, values) => {
                json!({"method": "equal", "attribute": attribute, "values": values})
            }
            Query::Search(attribute, term) => {
                json!({"method": "search", "attribute": attribute, "values": [term]})
            }
            Query::OrderAsc(attribute) => json!({"method": "orderAsc", "attribute": attribute}),
            Query::OrderDesc(attribute) => json!({"method": "orderDesc", "attribute": attribute}),
            Query::Limit(limit) => json!({"method": "limit", "values": [limit]}),
            Query::Offset(offset) => json!({"method": "offset", "values": [offset]}),
            Query::Select(attributes) => json!({"method": "select", "values": attributes}),
            Query::Or(queries) => {
                let values: Vec<Value> = queries.iter().map(Query::to_json).collect();
                json!({"method": "or", "values": values})
            }
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
