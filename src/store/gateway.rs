//! Generic CRUD over logical collection paths.
//!
//! The four entity kinds share identical addressing and subscription
//! mechanics, so one gateway serves them all; only draft validation is
//! per-kind. Write failures are logged *and* re-raised — the caller decides
//! what the form does with them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::logging;

use super::path::{self, CollectionPath, DocumentPath, PathRef};
use super::{Doc, DocumentStore, ListenerHandle, StoreError, StoreResult};
use crate::models::Draft;

/// How `create` picks document ids.
///
/// The two behaviors existed side by side in earlier forms of this console,
/// so the choice is an explicit argument rather than a hidden default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IdPolicy {
    /// `<collectionName><epochMillis>`, written set-if-absent. A collision
    /// (two creates in the same millisecond under one collection) surfaces
    /// as `DuplicateId` instead of overwriting.
    TimestampTagged,
    /// Let the store mint an opaque id.
    StoreAssigned,
}

/// Live-query handle. `cancel()` is idempotent and hard: the guard flag is
/// checked inside the snapshot wrapper, so no callback can run after
/// `cancel()` returns — even if the underlying channel delivers late.
pub(crate) struct Subscription {
    cancelled: Rc<Cell<bool>>,
    handle: RefCell<Option<ListenerHandle>>,
}

impl Subscription {
    pub fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        if let Some(handle) = self.handle.borrow_mut().take() {
            handle.detach();
        }
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Clone)]
pub(crate) struct CollectionGateway {
    store: Rc<dyn DocumentStore>,
}

impl CollectionGateway {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Rc<dyn DocumentStore> {
        self.store.clone()
    }

    fn collection(logical: &str) -> StoreResult<CollectionPath> {
        match path::resolve(logical, None)? {
            PathRef::Collection(col) => Ok(col),
            PathRef::Document(doc) => Err(StoreError::InvalidPath(doc.join())),
        }
    }

    fn document(logical: &str, id: &str) -> StoreResult<DocumentPath> {
        match path::resolve(logical, Some(id))? {
            PathRef::Document(doc) => Ok(doc),
            PathRef::Collection(col) => Err(StoreError::InvalidPath(col.join())),
        }
    }

    /// Single ordered fetch. Empty collections come back as an empty vec.
    pub async fn read(&self, logical: &str, order_field: Option<&str>) -> StoreResult<Vec<Doc>> {
        let col = Self::collection(logical)?;
        self.store
            .get_all(&col, order_field)
            .await
            .map_err(|err| fail("read", logical, err))
    }

    /// Register a live query. `on_change` gets the full ordered snapshot
    /// once immediately and after every change; channel errors never reach
    /// it (implementations log them instead).
    pub fn subscribe(
        &self,
        logical: &str,
        order_field: Option<&str>,
        on_change: impl Fn(Vec<Doc>) + 'static,
    ) -> StoreResult<Subscription> {
        let col = Self::collection(logical)?;

        let cancelled = Rc::new(Cell::new(false));
        let guard = cancelled.clone();
        let handle = self.store.listen(
            &col,
            order_field,
            Rc::new(move |docs| {
                if guard.get() {
                    return;
                }
                on_change(docs);
            }),
        );

        Ok(Subscription {
            cancelled,
            handle: RefCell::new(Some(handle)),
        })
    }

    /// Validate and write a new document, stamping `createdAt`/`updatedAt`
    /// from the store clock. The returned doc carries whichever id was
    /// actually used.
    pub async fn create(
        &self,
        logical: &str,
        draft: &Draft,
        id_policy: IdPolicy,
    ) -> StoreResult<Doc> {
        let col = Self::collection(logical)?;
        let mut fields = draft.validate()?;

        let now = self.store.clock_ms();
        fields.insert("createdAt".into(), now.into());
        fields.insert("updatedAt".into(), now.into());

        match id_policy {
            IdPolicy::TimestampTagged => {
                let id = format!("{}{}", col.leaf(), now);
                let doc_path = col.doc(&id)?;
                self.store
                    .create_at(&doc_path, fields.clone())
                    .await
                    .map_err(|err| fail("create", logical, err))?;
                Ok(Doc::new(id, fields))
            }
            IdPolicy::StoreAssigned => {
                let id = self
                    .store
                    .insert(&col, fields.clone())
                    .await
                    .map_err(|err| fail("create", logical, err))?;
                Ok(Doc::new(id, fields))
            }
        }
    }

    /// Validate and merge the draft's fields plus a fresh `updatedAt` into
    /// an existing document. Fields the draft does not carry stay untouched;
    /// nested objects it does carry are replaced wholesale.
    pub async fn update(&self, logical: &str, id: &str, draft: &Draft) -> StoreResult<()> {
        let doc_path = Self::document(logical, id)?;
        let mut fields = draft.validate()?;
        fields.insert("updatedAt".into(), self.store.clock_ms().into());

        self.store
            .merge(&doc_path, fields)
            .await
            .map_err(|err| fail("update", logical, err))
    }

    pub async fn delete(&self, logical: &str, id: &str) -> StoreResult<()> {
        let doc_path = Self::document(logical, id)?;
        self.store
            .remove(&doc_path)
            .await
            .map_err(|err| fail("delete", logical, err))
    }
}

fn fail(op: &str, logical: &str, err: StoreError) -> StoreError {
    logging::error!("gateway {op} {logical}: {err}");
    err
}
