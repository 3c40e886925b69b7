//! BSON to JSON rendering for responses.
//!
//! Identifiers render as their hexadecimal string and timestamps as RFC 3339, the
//! same shapes clients send back in identifier tokens and filters.

use bson::{Bson, Document};
use docrest::{collection::FindResult, page::Page};
use serde_json::{Map, Value};

pub fn bson(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(at) => match at.try_to_rfc3339_string() {
            Ok(text) => Value::String(text),
            Err(_) => Value::from(at.timestamp_millis()),
        },
        Bson::Document(document) => self::document(document),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson).collect()),
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::String(s) => Value::String(s),
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::Double(n) => Value::from(n),
        other => serde_json::to_value(&other).unwrap_or(Value::Null),
    }
}

pub fn document(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson(value)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn documents(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(document).collect())
}

pub fn find_result(result: FindResult) -> Value {
    match result {
        FindResult::Documents(docs) => documents(docs),
        FindResult::Page(page) => {
            let page = Page::new(page.total, page.data.into_iter().map(document).collect::<Vec<_>>());
            serde_json::to_value(page).unwrap_or(Value::Null)
        }
    }
}
