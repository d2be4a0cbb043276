//! The console's view state machine.
//!
//! One view is current at a time; switching cancels the previous view's
//! live subscription *before* anything else happens, so at most one
//! subscription ever exists and a late snapshot from the old view can never
//! repaint the new one. Live views (customers, products) re-render their
//! list from each snapshot; orders and carts are read once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::models::{Cart, Customer, Order, Product};
use crate::store::gateway::{CollectionGateway, Subscription};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum View {
    Customers,
    Products,
    Orders,
    Carts,
}

impl View {
    pub const ALL: [View; 4] = [View::Customers, View::Products, View::Orders, View::Carts];

    /// Collection name under the company scope; also the strum string.
    pub fn collection(self) -> &'static str {
        match self {
            View::Customers => "customers",
            View::Products => "products",
            View::Orders => "orders",
            View::Carts => "carts",
        }
    }

    pub fn order_field(self) -> &'static str {
        match self {
            View::Products => "name",
            _ => "createdAt",
        }
    }

    /// Live views hold a subscription; the rest are read once.
    pub fn is_live(self) -> bool {
        matches!(self, View::Customers | View::Products)
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Customers => "Customers",
            View::Products => "Products",
            View::Orders => "Orders",
            View::Carts => "Carts",
        }
    }
}

/// Rendering-side effects of the state machine. The console implements this
/// over signals; tests record the calls.
pub(crate) trait ViewSink {
    /// A transition happened: show the loading placeholder and the view's
    /// layout. Always called synchronously from `select_view`.
    fn view_changed(&self, view: View);
    fn customers(&self, rows: Vec<Customer>);
    fn products(&self, rows: Vec<Product>);
    fn orders(&self, rows: Vec<Order>);
    fn carts(&self, rows: Vec<Cart>);
    /// Inline failure message; never a panic.
    fn load_failed(&self, view: View, message: String);
}

/// Dispatches the read-once futures. The console passes
/// `leptos::task::spawn_local`; tests queue and drive futures by hand.
pub(crate) type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

pub(crate) struct ViewController {
    gateway: CollectionGateway,
    company_id: String,
    sink: Rc<dyn ViewSink>,
    spawner: Spawner,
    current: Cell<View>,
    /// Bumped on every transition; a read-once result whose epoch no longer
    /// matches is stale and dropped. Shared so in-flight futures can check
    /// it without holding the controller itself.
    epoch: Rc<Cell<u64>>,
    /// The single live-subscription slot. Exclusively owned here.
    active: RefCell<Option<Subscription>>,
}

impl ViewController {
    pub fn new(
        gateway: CollectionGateway,
        company_id: &str,
        sink: Rc<dyn ViewSink>,
        spawner: Spawner,
    ) -> Self {
        Self {
            gateway,
            company_id: company_id.to_string(),
            sink,
            spawner,
            current: Cell::new(View::Customers),
            epoch: Rc::new(Cell::new(0)),
            active: RefCell::new(None),
        }
    }

    pub fn current(&self) -> View {
        self.current.get()
    }

    pub fn collection_path(&self, view: View) -> String {
        format!("companies/{}/{}", self.company_id, view.collection())
    }

    pub fn select_view(&self, view: View) {
        // 1) Tear down the previous subscription. Idempotent, and done
        //    before the new one exists so the slot never holds two.
        self.cancel_active();
        self.epoch.set(self.epoch.get() + 1);
        self.current.set(view);

        // 2) Loading placeholder, synchronously.
        self.sink.view_changed(view);

        let path = self.collection_path(view);
        if view.is_live() {
            // 3) Live list: every snapshot repaints the list pane only.
            let sink = self.sink.clone();
            let result = self.gateway.subscribe(&path, Some(view.order_field()), move |docs| {
                match view {
                    View::Customers => {
                        sink.customers(docs.iter().map(Customer::from_doc).collect())
                    }
                    View::Products => sink.products(docs.iter().map(Product::from_doc).collect()),
                    View::Orders | View::Carts => {}
                }
            });

            match result {
                Ok(subscription) => *self.active.borrow_mut() = Some(subscription),
                Err(err) => self.sink.load_failed(view, err.to_string()),
            }
        } else {
            // 4) Static list: one read, inline message on failure.
            let gateway = self.gateway.clone();
            let sink = self.sink.clone();
            let epoch = self.epoch.clone();
            let my_epoch = epoch.get();
            (self.spawner)(Box::pin(async move {
                let outcome = gateway.read(&path, Some(view.order_field())).await;
                if epoch.get() != my_epoch {
                    // The user already moved on.
                    return;
                }

                match outcome {
                    Ok(docs) => match view {
                        View::Orders => sink.orders(docs.iter().map(Order::from_doc).collect()),
                        View::Carts => sink.carts(docs.iter().map(Cart::from_doc).collect()),
                        View::Customers | View::Products => {}
                    },
                    Err(err) => sink.load_failed(view, err.to_string()),
                }
            }));
        }
    }

    /// Final teardown on logout or navigation away.
    pub fn shutdown(&self) {
        self.cancel_active();
        self.epoch.set(self.epoch.get() + 1);
    }

    fn cancel_active(&self) {
        if let Some(subscription) = self.active.borrow_mut().take() {
            subscription.cancel();
        }
    }

    #[cfg(test)]
    fn has_active_subscription(&self) -> bool {
        self.active.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerDraft, Draft};
    use crate::store::gateway::IdPolicy;
    use crate::store::memory::MemoryStore;
    use crate::store::path::{CollectionPath, DocumentPath};
    use crate::store::{Doc, DocumentStore, Fields, ListenerHandle, SnapshotFn, StoreError, StoreResult};
    use futures::executor::block_on;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    enum Ev {
        Changed(View),
        Customers(Vec<String>),
        Products(Vec<String>),
        Orders(usize),
        Carts(usize),
        Failed(View, String),
    }

    struct RecordingSink(RefCell<Vec<Ev>>);

    impl RecordingSink {
        fn new() -> Rc<Self> {
            Rc::new(Self(RefCell::new(Vec::new())))
        }

        fn events(&self) -> std::cell::Ref<'_, Vec<Ev>> {
            self.0.borrow()
        }
    }

    impl ViewSink for RecordingSink {
        fn view_changed(&self, view: View) {
            self.0.borrow_mut().push(Ev::Changed(view));
        }

        fn customers(&self, rows: Vec<Customer>) {
            self.0
                .borrow_mut()
                .push(Ev::Customers(rows.into_iter().map(|c| c.name).collect()));
        }

        fn products(&self, rows: Vec<Product>) {
            self.0
                .borrow_mut()
                .push(Ev::Products(rows.into_iter().map(|p| p.name).collect()));
        }

        fn orders(&self, rows: Vec<Order>) {
            self.0.borrow_mut().push(Ev::Orders(rows.len()));
        }

        fn carts(&self, rows: Vec<Cart>) {
            self.0.borrow_mut().push(Ev::Carts(rows.len()));
        }

        fn load_failed(&self, view: View, message: String) {
            self.0.borrow_mut().push(Ev::Failed(view, message));
        }
    }

    type FutureQueue = Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>;

    /// Spawner that queues futures so tests control when async work lands.
    fn queue_spawner() -> (Spawner, FutureQueue) {
        let queue: FutureQueue = Rc::new(RefCell::new(Vec::new()));
        let q = queue.clone();
        let spawner: Spawner = Rc::new(move |fut| q.borrow_mut().push(fut));
        (spawner, queue)
    }

    fn drain(queue: &FutureQueue) {
        let pending: Vec<_> = queue.borrow_mut().drain(..).collect();
        for fut in pending {
            block_on(fut);
        }
    }

    fn controller(
        store: Rc<dyn DocumentStore>,
        company_id: &str,
    ) -> (
        ViewController,
        Rc<RecordingSink>,
        Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>,
    ) {
        let sink = RecordingSink::new();
        let (spawner, queue) = queue_spawner();
        let ctrl = ViewController::new(
            CollectionGateway::new(store),
            company_id,
            sink.clone(),
            spawner,
        );
        (ctrl, sink, queue)
    }

    #[test]
    fn test_live_view_subscribes_and_streams_list_updates() {
        let store = Rc::new(MemoryStore::with_clock(|| 50));
        let (ctrl, sink, _) = controller(store.clone(), "acme");

        ctrl.select_view(View::Customers);
        assert!(ctrl.has_active_subscription());

        let gw = CollectionGateway::new(store);
        block_on(gw.create(
            "companies/acme/customers",
            &Draft::Customer(CustomerDraft {
                name: "Jane".into(),
                ..Default::default()
            }),
            IdPolicy::StoreAssigned,
        ))
        .expect("create");

        assert_eq!(
            *sink.events(),
            vec![
                Ev::Changed(View::Customers),
                Ev::Customers(vec![]),
                Ev::Customers(vec!["Jane".into()]),
            ]
        );
    }

    #[test]
    fn test_static_view_reads_once_without_subscription() {
        // Demo data is scoped under the seeded company.
        let store = Rc::new(MemoryStore::with_demo_data());
        let (ctrl, sink, queue) = controller(store, "aurora");

        ctrl.select_view(View::Orders);
        assert!(!ctrl.has_active_subscription());

        drain(&queue);
        assert_eq!(
            *sink.events(),
            vec![Ev::Changed(View::Orders), Ev::Orders(1)]
        );
    }

    #[test]
    fn test_stale_read_once_result_is_dropped() {
        let store = Rc::new(MemoryStore::with_demo_data());
        let (ctrl, sink, queue) = controller(store, "aurora");

        // Switch away before the orders read ever runs.
        ctrl.select_view(View::Orders);
        ctrl.select_view(View::Carts);
        drain(&queue);

        assert_eq!(
            *sink.events(),
            vec![
                Ev::Changed(View::Orders),
                Ev::Changed(View::Carts),
                Ev::Carts(1),
            ],
            "the orders result must not land after the switch"
        );
    }

    /// Store double whose listeners never emit on their own: registration
    /// is recorded, initial snapshots are withheld, and the test replays
    /// callbacks — including ones that were already detached — to model
    /// late channel delivery.
    struct HoldStore {
        next_id: Cell<u64>,
        captured: RefCell<Vec<SnapshotFn>>,
        live_handles: Rc<RefCell<Vec<u64>>>,
    }

    impl HoldStore {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                next_id: Cell::new(1),
                captured: RefCell::new(Vec::new()),
                live_handles: Rc::new(RefCell::new(Vec::new())),
            })
        }

        /// Replay the nth callback ever registered, live or not.
        fn fire_captured(&self, index: usize, docs: Vec<Doc>) {
            let cb = self.captured.borrow()[index].clone();
            cb(docs);
        }
    }

    #[async_trait::async_trait(?Send)]
    impl DocumentStore for HoldStore {
        async fn get_all(
            &self,
            _collection: &CollectionPath,
            _order_field: Option<&str>,
        ) -> StoreResult<Vec<Doc>> {
            Err(StoreError::Backend("reads unavailable".into()))
        }

        async fn query_eq(
            &self,
            _collection: &CollectionPath,
            _filters: &[(&str, serde_json::Value)],
        ) -> StoreResult<Vec<Doc>> {
            Ok(vec![])
        }

        async fn insert(&self, _collection: &CollectionPath, _fields: Fields) -> StoreResult<String> {
            Ok("x".into())
        }

        async fn create_at(&self, _doc: &DocumentPath, _fields: Fields) -> StoreResult<()> {
            Ok(())
        }

        async fn merge(&self, _doc: &DocumentPath, _fields: Fields) -> StoreResult<()> {
            Ok(())
        }

        async fn remove(&self, _doc: &DocumentPath) -> StoreResult<()> {
            Ok(())
        }

        fn listen(
            &self,
            _collection: &CollectionPath,
            _order_field: Option<&str>,
            on_snapshot: SnapshotFn,
        ) -> ListenerHandle {
            let id = self.next_id.get();
            self.next_id.set(id + 1);

            self.captured.borrow_mut().push(on_snapshot);
            self.live_handles.borrow_mut().push(id);

            let live_handles = self.live_handles.clone();
            ListenerHandle::new(move || {
                live_handles.borrow_mut().retain(|x| *x != id);
            })
        }

        fn clock_ms(&self) -> i64 {
            0
        }
    }

    #[test]
    fn test_view_switch_keeps_exactly_one_subscription() {
        // Immediate customers -> products switch; the customers
        // snapshot only arrives afterwards.
        let store = HoldStore::new();
        let (ctrl, sink, _) = controller(store.clone(), "acme");

        ctrl.select_view(View::Customers);
        ctrl.select_view(View::Products);

        assert_eq!(store.live_handles.borrow().len(), 1, "only the products listener is attached");
        assert!(ctrl.has_active_subscription());

        // Late first snapshot of the cancelled customers subscription.
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("Ghost"));
        store.fire_captured(0, vec![Doc::new("c1", fields)]);

        // Products snapshot arrives normally.
        let mut fields = Fields::new();
        fields.insert("name".into(), json!("Café"));
        store.fire_captured(1, vec![Doc::new("p1", fields)]);

        assert_eq!(
            *sink.events(),
            vec![
                Ev::Changed(View::Customers),
                Ev::Changed(View::Products),
                Ev::Products(vec!["Café".into()]),
            ],
            "zero pending callbacks from the cancelled customers view"
        );
    }

    #[test]
    fn test_shutdown_cancels_and_silences() {
        let store = HoldStore::new();
        let (ctrl, sink, _) = controller(store.clone(), "acme");

        ctrl.select_view(View::Customers);
        ctrl.shutdown();
        assert!(!ctrl.has_active_subscription());

        store.fire_captured(0, vec![]);
        assert_eq!(*sink.events(), vec![Ev::Changed(View::Customers)]);
    }

    #[test]
    fn test_static_read_failure_surfaces_inline() {
        let store = HoldStore::new();
        let (ctrl, sink, queue) = controller(store, "acme");

        ctrl.select_view(View::Orders);
        drain(&queue);

        let events = sink.events();
        assert_eq!(events[0], Ev::Changed(View::Orders));
        match &events[1] {
            Ev::Failed(View::Orders, message) => {
                assert!(message.contains("reads unavailable"));
            }
            other => panic!("expected a load failure, got {other:?}"),
        }
    }

    #[test]
    fn test_view_strings_and_order_fields() {
        assert_eq!(View::Customers.to_string(), "customers");
        assert_eq!("products".parse::<View>(), Ok(View::Products));
        assert_eq!(View::Products.order_field(), "name");
        assert_eq!(View::Orders.order_field(), "createdAt");
        assert!(View::Customers.is_live());
        assert!(!View::Carts.is_live());
    }
}
