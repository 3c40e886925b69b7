//! Document representation and lifecycle timestamps.
//!
//! Documents are schemaless, ordered mappings of field names to BSON values. BSON
//! already is a recursive tagged value type (null, booleans, numbers, strings,
//! sequences, nested mappings and the store's native identifier), so the core works
//! on [`bson::Document`] directly instead of a dynamically typed map.
//!
//! Every document created or replaced through the core carries two system fields,
//! [`CREATE_TIME`] and [`UPDATE_TIME`], stamped from a [`Clock`].

use std::fmt::Debug;

use bson::DateTime;
use chrono::Utc;

pub use bson::Document;

/// Name of the store's native identifier field.
pub const ID_FIELD: &str = "_id";

/// System field holding the instant a document was created (or last replaced).
pub const CREATE_TIME: &str = "create_time";

/// System field holding the instant a document was last mutated.
pub const UPDATE_TIME: &str = "update_time";

/// Source of the instants written into the lifecycle timestamp fields.
///
/// The store uses [`SystemClock`] unless another clock is supplied, which is mostly
/// useful in tests that need to assert exact timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime;
}

/// Wall clock backed by [`chrono::Utc`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        DateTime::from_chrono(Utc::now())
    }
}

/// Writes both lifecycle timestamps onto `document` using a single instant.
pub(crate) fn stamp_created(document: &mut Document, now: DateTime) {
    document.insert(CREATE_TIME, now);
    document.insert(UPDATE_TIME, now);
}
