//! Request binding: query strings, pagination headers and bodies.
//!
//! All request validation happens here; the core only sees typed inputs.

use axum::http::HeaderMap;
use bson::Document;
use docrest::{
    page::Pagination,
    query::{Filter, SortSpec},
};
use serde::Deserialize;

use crate::error::ApiError;

pub const PAGE_HEADER: &str = "page";
pub const PAGE_SIZE_HEADER: &str = "pagesize";

/// Query parameters shared by the find and update dispatchers.
///
/// `id` and `sort` may repeat; `where` is a JSON object.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestQuery {
    pub ids: Vec<String>,
    pub filter: Filter,
    pub sort: Vec<String>,
    pub single: bool,
    pub multiple: bool,
}

impl RequestQuery {
    /// Binds decoded `key=value` pairs. Unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut query = RequestQuery::default();

        for (key, value) in pairs {
            match key.as_str() {
                "id" => query.ids.push(value),
                "sort" => query.sort.push(value),
                "where" => query.filter = parse_where(&value)?.into(),
                "single" => query.single = parse_flag(&key, &value)?,
                "multiple" => query.multiple = parse_flag(&key, &value)?,
                _ => {}
            }
        }

        Ok(query)
    }

    pub fn sort_spec(&self) -> Result<SortSpec, ApiError> {
        Ok(SortSpec::parse(&self.sort)?)
    }
}

fn parse_where(raw: &str) -> Result<Document, ApiError> {
    if raw.trim().is_empty() {
        return Ok(Document::new());
    }

    serde_json::from_str::<Document>(raw)
        .map_err(|e| ApiError::Binding(format!("where must be a JSON object: {e}")))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ApiError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ApiError::Binding(format!("{key} must be a boolean, got {raw:?}"))),
    }
}

/// Reads the `page` and `pagesize` headers.
///
/// An absent or zero header means "not set"; the read is paginated only when both
/// are set.
pub fn pagination(headers: &HeaderMap) -> Result<Option<Pagination>, ApiError> {
    let index = header_number(headers, PAGE_HEADER)?;
    let size = header_number(headers, PAGE_SIZE_HEADER)?;

    if size != 0 && !Pagination::ALLOWED_SIZES.contains(&size) {
        return Err(ApiError::Binding(format!(
            "{PAGE_SIZE_HEADER} must be one of {:?}, got {size}",
            Pagination::ALLOWED_SIZES
        )));
    }

    Ok(Pagination::new(index, size))
}

fn header_number(headers: &HeaderMap, name: &str) -> Result<u64, ApiError> {
    let Some(value) = headers.get(name) else {
        return Ok(0);
    };

    value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or_else(|| ApiError::Binding(format!("{name} header must be a positive number")))
}

/// Body of create and replace requests.
#[derive(Debug, Deserialize)]
pub struct DocBody {
    pub doc: Document,
}

/// Body of update requests.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    pub update: Document,
}
