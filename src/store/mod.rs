pub(crate) mod gateway;
pub(crate) mod memory;
pub(crate) mod path;
pub(crate) mod remote;

use std::cmp::Ordering;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::path::{CollectionPath, DocumentPath};

/// Top-level field map of a stored document.
pub(crate) type Fields = serde_json::Map<String, Value>;

pub(crate) type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("invalid logical path `{0}`")]
    InvalidPath(String),

    #[error("document `{id}` already exists under `{path}`")]
    DuplicateId { path: String, id: String },

    #[error("document `{id}` not found under `{path}`")]
    NotFound { path: String, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("store backend: {0}")]
    Backend(String),
}

/// One document row as delivered by the store: its id plus the field map.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Doc {
    pub id: String,
    pub fields: Fields,
}

impl Doc {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self { id: id.into(), fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> String {
        self.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Integer read tolerant of float-typed and string-typed history.
    pub fn get_i64(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }
}

/// Callback invoked with the full, ordered result set of a live query.
pub(crate) type SnapshotFn = Rc<dyn Fn(Vec<Doc>)>;

/// Detaches a live-query listener from its store when invoked.
pub(crate) struct ListenerHandle(Box<dyn FnOnce()>);

impl ListenerHandle {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self(Box::new(detach))
    }

    pub fn detach(self) {
        (self.0)()
    }
}

/// The hosted document database, reduced to what this console consumes.
///
/// Implementations must deliver `listen` snapshots as complete, recomputed
/// result sets (never deltas), distinguish missing documents from transport
/// failures, and hand out a non-decreasing millisecond clock for write
/// stamping.
#[async_trait(?Send)]
pub(crate) trait DocumentStore {
    /// Fetch every document of a collection, ascending by `order_field`
    /// when given. Empty collections yield an empty vec.
    async fn get_all(
        &self,
        collection: &CollectionPath,
        order_field: Option<&str>,
    ) -> StoreResult<Vec<Doc>>;

    /// Equality query: documents whose fields match every `(field, value)`
    /// pair. Value comparison is typed (a number never equals its digit
    /// string).
    async fn query_eq(
        &self,
        collection: &CollectionPath,
        filters: &[(&str, Value)],
    ) -> StoreResult<Vec<Doc>>;

    /// Insert with a store-assigned opaque id; returns that id.
    async fn insert(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String>;

    /// Set-if-absent at an explicit id; `DuplicateId` when the document
    /// already exists.
    async fn create_at(&self, doc: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Shallow top-level merge into an existing document; `NotFound` when
    /// the target is missing. Nested objects are replaced wholesale.
    async fn merge(&self, doc: &DocumentPath, fields: Fields) -> StoreResult<()>;

    /// Delete an existing document; `NotFound` when missing.
    async fn remove(&self, doc: &DocumentPath) -> StoreResult<()>;

    /// Register a live query. The callback receives the full ordered
    /// snapshot once on registration and after every mutation of the
    /// collection. Channel errors go to the logging sink, not the callback.
    fn listen(
        &self,
        collection: &CollectionPath,
        order_field: Option<&str>,
        on_snapshot: SnapshotFn,
    ) -> ListenerHandle;

    /// Millisecond timestamp used to stamp writes; non-decreasing.
    fn clock_ms(&self) -> i64;
}

/// Ascending order by one top-level field, stable.
///
/// Documents missing the field sort first rather than being dropped.
pub(crate) fn order_docs(docs: &mut [Doc], order_field: Option<&str>) {
    let Some(field) = order_field else {
        return;
    };

    docs.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Doc {
        let Value::Object(map) = fields else {
            unreachable!()
        };
        Doc::new(id, map)
    }

    #[test]
    fn test_order_docs_numeric_ascending() {
        let mut docs = vec![
            doc("b", json!({"createdAt": 300})),
            doc("a", json!({"createdAt": 100})),
            doc("c", json!({"createdAt": 200})),
        ];
        order_docs(&mut docs, Some("createdAt"));
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[test]
    fn test_order_docs_string_field() {
        let mut docs = vec![
            doc("1", json!({"name": "Banana"})),
            doc("2", json!({"name": "Abacaxi"})),
        ];
        order_docs(&mut docs, Some("name"));
        assert_eq!(docs[0].id, "2");
    }

    #[test]
    fn test_order_docs_missing_field_sorts_first() {
        let mut docs = vec![
            doc("with", json!({"createdAt": 5})),
            doc("without", json!({})),
        ];
        order_docs(&mut docs, Some("createdAt"));
        assert_eq!(docs[0].id, "without");
    }

    #[test]
    fn test_order_docs_none_keeps_store_order() {
        let mut docs = vec![doc("z", json!({})), doc("a", json!({}))];
        order_docs(&mut docs, None);
        assert_eq!(docs[0].id, "z");
    }

    #[test]
    fn test_doc_get_i64_tolerates_types() {
        let d = doc(
            "x",
            json!({"a": 7, "b": 7.9, "c": "12", "d": "junk", "e": null}),
        );
        assert_eq!(d.get_i64("a"), 7);
        assert_eq!(d.get_i64("b"), 7);
        assert_eq!(d.get_i64("c"), 12);
        assert_eq!(d.get_i64("d"), 0);
        assert_eq!(d.get_i64("e"), 0);
        assert_eq!(d.get_i64("missing"), 0);
    }
}
