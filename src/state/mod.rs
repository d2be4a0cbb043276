pub(crate) mod panel;
pub(crate) mod view;

use std::rc::Rc;

use leptos::prelude::*;

use crate::models::Company;
use crate::session::SessionStore;
use crate::store::gateway::CollectionGateway;
use crate::store::memory::MemoryStore;
use crate::store::remote::{EnvConfig, RemoteStore};
use crate::store::DocumentStore;

pub(crate) struct AppState {
    pub session: SessionStore,
    pub gateway: CollectionGateway,

    /// Hydrated from the session store at startup; `None` means the login
    /// screen.
    pub company: RwSignal<Option<Company>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = EnvConfig::new();
        let store: Rc<dyn DocumentStore> = if config.demo {
            Rc::new(MemoryStore::with_demo_data())
        } else {
            Rc::new(RemoteStore::new(&config))
        };

        let session = SessionStore::browser();
        let company = RwSignal::new(session.load());

        Self {
            session,
            gateway: CollectionGateway::new(store),
            company,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Context handle for [`AppState`].
///
/// The state holds `Rc`-backed stores, so it lives in a local stored value;
/// the handle itself is `Copy + Send` and safe to capture in views and
/// event handlers.
#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub StoredValue<AppState, LocalStorage>);

impl AppContext {
    pub fn new() -> Self {
        Self(StoredValue::new_local(AppState::new()))
    }

    pub fn company(&self) -> RwSignal<Option<Company>> {
        self.0.with_value(|s| s.company)
    }

    pub fn gateway(&self) -> CollectionGateway {
        self.0.with_value(|s| s.gateway.clone())
    }

    pub fn session(&self) -> SessionStore {
        self.0.with_value(|s| s.session.clone())
    }
}
