//! Logical path addressing.
//!
//! Collections live at odd segment counts (`companies/{id}/customers`);
//! appending one more segment addresses a document. Callers sometimes hand
//! over an even-length path whose last segment is really a document id, so
//! resolution splits on parity instead of trusting the caller.

use super::{StoreError, StoreResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Parse a collection path (odd number of non-empty segments).
    pub fn parse(logical: &str) -> StoreResult<Self> {
        match resolve(logical, None)? {
            PathRef::Collection(col) => Ok(col),
            PathRef::Document(_) => Err(StoreError::InvalidPath(logical.to_string())),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The collection's own name (last segment).
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn join(&self) -> String {
        self.segments.join("/")
    }

    pub fn doc(&self, id: &str) -> StoreResult<DocumentPath> {
        if id.trim().is_empty() {
            return Err(StoreError::InvalidPath(format!("{}/<empty id>", self.join())));
        }

        Ok(DocumentPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl DocumentPath {
    pub fn join(&self) -> String {
        format!("{}/{}", self.collection.join(), self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PathRef {
    Collection(CollectionPath),
    Document(DocumentPath),
}

/// Resolve a logical path, optionally with an explicit document id.
///
/// Without an id: an odd segment count is a collection, an even count is
/// `.../{collection}/{docId}`. With an id, the path itself must be a
/// collection. Empty paths, empty segments and empty ids are invalid.
pub(crate) fn resolve(logical: &str, id: Option<&str>) -> StoreResult<PathRef> {
    let trimmed = logical.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath(logical.to_string()));
    }

    let segments: Vec<String> = trimmed.split('/').map(|s| s.trim().to_string()).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(logical.to_string()));
    }

    let is_collection = segments.len() % 2 == 1;

    match id {
        Some(doc_id) => {
            if !is_collection {
                // `a/b` + id would nest a document under a document.
                return Err(StoreError::InvalidPath(format!("{logical}/{doc_id}")));
            }
            let col = CollectionPath { segments };
            Ok(PathRef::Document(col.doc(doc_id)?))
        }
        None if is_collection => Ok(PathRef::Collection(CollectionPath { segments })),
        None => {
            let mut segments = segments;
            let Some(doc_id) = segments.pop() else {
                return Err(StoreError::InvalidPath(logical.to_string()));
            };
            let col = CollectionPath { segments };
            Ok(PathRef::Document(col.doc(&doc_id)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_path_is_collection() {
        let r = resolve("companies/acme/customers", None).expect("should resolve");
        match r {
            PathRef::Collection(col) => {
                assert_eq!(col.join(), "companies/acme/customers");
                assert_eq!(col.leaf(), "customers");
            }
            PathRef::Document(_) => panic!("odd-length path must be a collection"),
        }
    }

    #[test]
    fn test_even_path_splits_off_document_id() {
        let r = resolve("companies/acme/customers/c42", None).expect("should resolve");
        match r {
            PathRef::Document(doc) => {
                assert_eq!(doc.collection.join(), "companies/acme/customers");
                assert_eq!(doc.id, "c42");
            }
            PathRef::Collection(_) => panic!("even-length path must be a document"),
        }
    }

    #[test]
    fn test_compose_decompose_round_trip() {
        // resolve(collectionPath, id), decomposed, yields the same pair.
        let composed = resolve("companies/acme/products", Some("p7")).expect("should resolve");
        let PathRef::Document(doc) = composed else {
            panic!("explicit id must address a document");
        };

        let re_resolved = resolve(&doc.join(), None).expect("joined path should resolve");
        assert_eq!(re_resolved, PathRef::Document(doc));
    }

    #[test]
    fn test_empty_path_is_invalid() {
        assert!(matches!(resolve("", None), Err(StoreError::InvalidPath(_))));
        assert!(matches!(resolve("  ", None), Err(StoreError::InvalidPath(_))));
        assert!(matches!(resolve("/", None), Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_empty_segment_is_invalid() {
        assert!(matches!(
            resolve("companies//customers", None),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_id_on_even_path_is_invalid() {
        assert!(matches!(
            resolve("companies/acme", Some("x")),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_empty_id_is_invalid() {
        assert!(matches!(
            resolve("companies", Some("")),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_single_segment_collection() {
        let col = CollectionPath::parse("companies").expect("should parse");
        assert_eq!(col.segments().len(), 1);
        assert_eq!(col.leaf(), "companies");
    }
}
