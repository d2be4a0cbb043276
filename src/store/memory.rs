//! In-memory `DocumentStore`.
//!
//! Reference implementation of the store contract: nested collections keyed
//! by joined path, live listeners re-notified with a full recomputed
//! snapshot after every mutation, and an injectable clock so id-collision
//! behavior is testable. Also backs the `DEMO` mode of the console.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::path::{CollectionPath, DocumentPath};
use super::{order_docs, Doc, DocumentStore, Fields, ListenerHandle, SnapshotFn, StoreError, StoreResult};
use crate::util::now_ms;

struct Listener {
    id: u64,
    path: String,
    order_field: Option<String>,
    on_snapshot: SnapshotFn,
}

struct Inner {
    collections: RefCell<HashMap<String, BTreeMap<String, Fields>>>,
    listeners: RefCell<Vec<Listener>>,
    next_listener_id: Cell<u64>,
    next_doc_seq: Cell<u64>,
    clock: Box<dyn Fn() -> i64>,
    last_ms: Cell<i64>,
}

#[derive(Clone)]
pub(crate) struct MemoryStore {
    inner: Rc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(now_ms)
    }

    /// Build with a custom clock. Tests pin the clock to force same-
    /// millisecond writes; the store only guarantees non-decreasing stamps.
    pub fn with_clock(clock: impl Fn() -> i64 + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                collections: RefCell::new(HashMap::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
                next_doc_seq: Cell::new(1),
                clock: Box::new(clock),
                last_ms: Cell::new(0),
            }),
        }
    }

    /// Seeded fixture backing `window.ENV.DEMO`.
    ///
    /// The company's CNPJ is stored as a JSON *number*, matching the
    /// historical data that made the login probe try numbers first.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        let t0 = store.clock_ms();

        store.put(
            "companies",
            "aurora",
            json!({
                "name": "Mercearia Aurora",
                "cnpj": 12_345_678_000_199i64,
                "ownerId": "aurora",
            }),
        );

        store.put(
            "companies/aurora/customers",
            "customers-seed-1",
            json!({
                "name": "Helena Prado",
                "phone": "(24) 99876-1020",
                "cpf": "123.456.789-00",
                "defaultAddress": {
                    "street": "Rua das Acácias", "number": 18, "neighborhood": "Centro",
                    "city": "Resende", "state": "RJ", "zip": "27511-000"
                },
                "alternateAddress": empty_address(),
                "shippingAddress": empty_address(),
                "billingAddress": empty_address(),
                "createdAt": t0,
                "updatedAt": t0,
            }),
        );

        store.put(
            "companies/aurora/products",
            "products-seed-1",
            json!({
                "sku": "CAF-500", "ean": "7891000100103",
                "name": "Café torrado 500g", "description": "Moagem média.",
                "priceCents": 1890, "stock": 24, "unit": "pct",
                "images": ["cafe.jpg"], "categories": ["mercearia", "bebidas"],
                "availableOnline": true, "whatsappCatalogId": "",
                "visibility": "public", "active": true,
                "meta": {"weightGrams": 500, "brand": "Serra Azul"},
                "createdAt": t0, "updatedAt": t0,
            }),
        );

        store.put(
            "companies/aurora/orders",
            "orders-seed-1",
            json!({
                "customerId": "customers-seed-1",
                "status": "delivered",
                "totalCents": 1890,
                "createdAt": t0,
            }),
        );

        store.put(
            "companies/aurora/carts",
            "carts-seed-1",
            json!({
                "customerId": "customers-seed-1",
                "status": "open",
                "createdAt": t0,
            }),
        );

        store
    }

    fn put(&self, collection: &str, id: &str, fields: Value) {
        let Value::Object(map) = fields else {
            return;
        };
        self.inner
            .collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), map);
    }

    fn snapshot(&self, path: &str, order_field: Option<&str>) -> Vec<Doc> {
        let mut docs: Vec<Doc> = self
            .inner
            .collections
            .borrow()
            .get(path)
            .map(|col| {
                col.iter()
                    .map(|(id, fields)| Doc::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        order_docs(&mut docs, order_field);
        docs
    }

    fn notify(&self, path: &str) {
        // Snapshot the matching listeners first so a callback that mutates
        // the store (or cancels itself) never re-enters the borrow.
        let targets: Vec<(SnapshotFn, Option<String>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.path == path)
            .map(|l| (l.on_snapshot.clone(), l.order_field.clone()))
            .collect();

        for (on_snapshot, order_field) in targets {
            on_snapshot(self.snapshot(path, order_field.as_deref()));
        }
    }
}

// Only used by the seed fixture above.
fn empty_address() -> Value {
    json!({"street": "", "number": 0, "neighborhood": "", "city": "", "state": "", "zip": ""})
}

#[async_trait(?Send)]
impl DocumentStore for MemoryStore {
    async fn get_all(
        &self,
        collection: &CollectionPath,
        order_field: Option<&str>,
    ) -> StoreResult<Vec<Doc>> {
        Ok(self.snapshot(&collection.join(), order_field))
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        filters: &[(&str, Value)],
    ) -> StoreResult<Vec<Doc>> {
        let docs = self
            .snapshot(&collection.join(), None)
            .into_iter()
            .filter(|doc| {
                filters
                    .iter()
                    .all(|(field, value)| doc.get(field) == Some(value))
            })
            .collect();
        Ok(docs)
    }

    async fn insert(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String> {
        let seq = self.inner.next_doc_seq.get();
        self.inner.next_doc_seq.set(seq + 1);
        let id = format!("doc-{seq:06}");

        let path = collection.join();
        self.inner
            .collections
            .borrow_mut()
            .entry(path.clone())
            .or_default()
            .insert(id.clone(), fields);

        self.notify(&path);
        Ok(id)
    }

    async fn create_at(&self, doc: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let path = doc.collection.join();
        {
            let mut collections = self.inner.collections.borrow_mut();
            let col = collections.entry(path.clone()).or_default();
            if col.contains_key(&doc.id) {
                return Err(StoreError::DuplicateId {
                    path,
                    id: doc.id.clone(),
                });
            }
            col.insert(doc.id.clone(), fields);
        }

        self.notify(&path);
        Ok(())
    }

    async fn merge(&self, doc: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let path = doc.collection.join();
        {
            let mut collections = self.inner.collections.borrow_mut();
            let existing = collections
                .get_mut(&path)
                .and_then(|col| col.get_mut(&doc.id))
                .ok_or_else(|| StoreError::NotFound {
                    path: path.clone(),
                    id: doc.id.clone(),
                })?;

            for (key, value) in fields {
                existing.insert(key, value);
            }
        }

        self.notify(&path);
        Ok(())
    }

    async fn remove(&self, doc: &DocumentPath) -> StoreResult<()> {
        let path = doc.collection.join();
        {
            let mut collections = self.inner.collections.borrow_mut();
            let removed = collections
                .get_mut(&path)
                .and_then(|col| col.remove(&doc.id));
            if removed.is_none() {
                return Err(StoreError::NotFound {
                    path,
                    id: doc.id.clone(),
                });
            }
        }

        self.notify(&path);
        Ok(())
    }

    fn listen(
        &self,
        collection: &CollectionPath,
        order_field: Option<&str>,
        on_snapshot: SnapshotFn,
    ) -> ListenerHandle {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);

        let path = collection.join();
        self.inner.listeners.borrow_mut().push(Listener {
            id,
            path: path.clone(),
            order_field: order_field.map(|s| s.to_string()),
            on_snapshot: on_snapshot.clone(),
        });

        // Initial full snapshot, delivered at registration.
        on_snapshot(self.snapshot(&path, order_field));

        let inner = self.inner.clone();
        ListenerHandle::new(move || {
            inner.listeners.borrow_mut().retain(|l| l.id != id);
        })
    }

    fn clock_ms(&self) -> i64 {
        let ms = (self.inner.clock)().max(self.inner.last_ms.get());
        self.inner.last_ms.set(ms);
        ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn col(path: &str) -> CollectionPath {
        CollectionPath::parse(path).expect("test path should parse")
    }

    fn fields(v: Value) -> Fields {
        let Value::Object(map) = v else { unreachable!() };
        map
    }

    #[test]
    fn test_get_all_empty_collection_is_empty_vec() {
        let store = MemoryStore::new();
        let docs = block_on(store.get_all(&col("companies/x/customers"), Some("createdAt")))
            .expect("read should succeed");
        assert!(docs.is_empty());
    }

    #[test]
    fn test_create_at_rejects_duplicate() {
        let store = MemoryStore::new();
        let doc = col("companies/x/customers").doc("c1").expect("doc path");

        block_on(store.create_at(&doc, fields(json!({"name": "a"})))).expect("first create");
        let err = block_on(store.create_at(&doc, fields(json!({"name": "b"}))))
            .expect_err("second create at same id must fail");
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[test]
    fn test_merge_missing_is_not_found() {
        let store = MemoryStore::new();
        let doc = col("companies/x/customers").doc("nope").expect("doc path");
        let err = block_on(store.merge(&doc, fields(json!({"a": 1})))).expect_err("must fail");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_query_eq_is_typed() {
        let store = MemoryStore::new();
        store.put("companies", "c1", json!({"cnpj": 12345678000199i64, "ownerId": "alice"}));

        let hits = block_on(store.query_eq(
            &col("companies"),
            &[("cnpj", json!(12345678000199i64)), ("ownerId", json!("alice"))],
        ))
        .expect("query");
        assert_eq!(hits.len(), 1);

        // The digit string must not match the numeric field.
        let misses = block_on(store.query_eq(
            &col("companies"),
            &[("cnpj", json!("12345678000199")), ("ownerId", json!("alice"))],
        ))
        .expect("query");
        assert!(misses.is_empty());
    }

    #[test]
    fn test_listen_initial_and_mutation_snapshots() {
        let store = MemoryStore::new();
        let customers = col("companies/x/customers");

        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let handle = store.listen(
            &customers,
            Some("createdAt"),
            Rc::new(move |docs| sink.borrow_mut().push(docs.len())),
        );

        let doc = customers.doc("c1").expect("doc path");
        block_on(store.create_at(&doc, fields(json!({"name": "a", "createdAt": 1}))))
            .expect("create");

        assert_eq!(*seen.borrow(), vec![0, 1]);

        handle.detach();
        block_on(store.remove(&doc)).expect("remove");
        assert_eq!(*seen.borrow(), vec![0, 1], "detached listener must stay silent");
    }

    #[test]
    fn test_clock_is_non_decreasing() {
        let t = Cell::new(100i64);
        // A clock that jumps backwards must still never make stamps regress.
        let store = MemoryStore::with_clock(move || {
            let v = t.get();
            t.set(v - 10);
            v
        });

        let a = store.clock_ms();
        let b = store.clock_ms();
        assert!(b >= a);
    }
}
