//! Update operator and replacement application for in-memory documents.
//!
//! Supports `$set`, `$unset` and `$inc` with dotted paths. As in the production
//! store, an update document must consist of operators only, and the `_id` field is
//! immutable.

use bson::{Bson, Document};

use docrest_core::{
    document::ID_FIELD,
    error::{BackendError, BackendResult},
};

/// Applies an operator update document to `document` in place.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> BackendResult<()> {
    if update.is_empty() || !update.keys().all(|key| key.starts_with('$')) {
        return Err(BackendError::Rejected(
            "update document requires atomic operators".to_string(),
        ));
    }

    for (op, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| BackendError::Rejected(format!("{op} requires a document argument")))?;

        for (path, value) in fields {
            if path == ID_FIELD || path.starts_with("_id.") {
                return Err(BackendError::Rejected(format!(
                    "performing an update on the path '{path}' would modify the immutable field '_id'"
                )));
            }

            match op.as_str() {
                "$set" => set_path(document, path, value.clone())?,
                "$unset" => unset_path(document, path),
                "$inc" => {
                    let current = crate::evaluator::lookup(document, path);
                    let next = increment(current, value, path)?;
                    set_path(document, path, next)?;
                }
                _ => {
                    return Err(BackendError::Rejected(format!("unknown update operator: {op}")));
                }
            }
        }
    }

    Ok(())
}

/// Builds the document that replaces `current`, keeping its identifier.
pub(crate) fn apply_replacement(current: &Document, replacement: Document) -> BackendResult<Document> {
    if replacement.keys().any(|key| key.starts_with('$')) {
        return Err(BackendError::Rejected(
            "replacement document must not contain update operators".to_string(),
        ));
    }

    let id = current.get(ID_FIELD).cloned().unwrap_or(Bson::Null);
    if let Some(new_id) = replacement.get(ID_FIELD) {
        if new_id != &id {
            return Err(BackendError::Rejected(
                "the (immutable) field '_id' was found to have been altered".to_string(),
            ));
        }
    }

    let mut replaced = Document::new();
    replaced.insert(ID_FIELD, id);
    for (key, value) in replacement {
        if key != ID_FIELD {
            replaced.insert(key, value);
        }
    }

    Ok(replaced)
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> BackendResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(Document::new()));

            match child {
                Bson::Document(child) => set_path(child, rest, value),
                _ => Err(BackendError::Rejected(format!(
                    "cannot create field '{rest}' in element {{{head}: {child}}}"
                ))),
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                unset_path(child, rest);
            }
        }
    }
}

fn increment(current: Option<&Bson>, by: &Bson, path: &str) -> BackendResult<Bson> {
    let not_numeric = || BackendError::Rejected(format!("cannot apply $inc to non-numeric field '{path}'"));

    let current = current.cloned().unwrap_or(Bson::Int32(0));
    Ok(match (&current, by) {
        (Bson::Int32(a), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(*a as i64 + *b as i64),
        },
        (Bson::Int32(a), Bson::Int64(b)) => Bson::Int64((*a as i64).wrapping_add(*b)),
        (Bson::Int64(a), Bson::Int32(b)) => Bson::Int64(a.wrapping_add(*b as i64)),
        (Bson::Int64(a), Bson::Int64(b)) => Bson::Int64(a.wrapping_add(*b)),
        (a, b) => Bson::Double(as_f64(a).ok_or_else(not_numeric)? + as_f64(b).ok_or_else(not_numeric)?),
    })
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(*n as f64),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}
