//! HTTP implementation of `DocumentStore`.
//!
//! Talks JSON to the hosted document API. Live queries are emulated with a
//! polling re-read: the watcher re-fetches on an interval and only invokes
//! the callback when the serialized snapshot actually changed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use leptos::logging;
use leptos::task::spawn_local;
use serde_json::{json, Value};
use wasm_bindgen::JsCast;

use super::path::{CollectionPath, DocumentPath};
use super::{Doc, DocumentStore, Fields, ListenerHandle, SnapshotFn, StoreError, StoreResult};
use crate::util::now_ms;

const DEFAULT_POLL_MS: i32 = 3000;

#[derive(Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub demo: bool,
}

impl EnvConfig {
    /// Read `window.ENV.API_URL` / `window.ENV.DEMO`. Absent or malformed
    /// values fall back to the localhost default and live (non-demo) mode.
    pub fn new() -> Self {
        let mut config = Self {
            api_url: "http://localhost:6689".to_string(),
            demo: false,
        };

        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url) = api_url.as_string() {
                            config.api_url = url;
                        }
                    }

                    if let Ok(demo) = js_sys::Reflect::get(&env, &"DEMO".into()) {
                        config.demo = is_truthy_flag(&demo);
                    }
                }
            }
        }

        config
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn is_truthy_flag(value: &wasm_bindgen::JsValue) -> bool {
    if let Some(b) = value.as_bool() {
        return b;
    }
    match value.as_string().as_deref() {
        Some("1") | Some("true") => true,
        _ => false,
    }
}

pub(crate) struct RemoteStore {
    base_url: String,
    poll_ms: i32,
    last_ms: Cell<i64>,
}

impl RemoteStore {
    pub fn new(config: &EnvConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            poll_ms: DEFAULT_POLL_MS,
            last_ms: Cell::new(0),
        }
    }

    async fn post(&self, endpoint: &str, body: Value, target: Option<&DocumentPath>) -> StoreResult<Value> {
        post_json(&self.base_url, endpoint, body, target).await
    }

    /// Accepts `{"docs": [{"id": ..., "fields": {...}}]}`; rows without a
    /// usable id are skipped.
    pub(crate) fn parse_docs_response(data: &Value) -> Vec<Doc> {
        let rows = data
            .get("docs")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            if id.trim().is_empty() {
                continue;
            }

            let fields: Fields = match row.get("fields") {
                Some(Value::Object(map)) => map.clone(),
                _ => Fields::new(),
            };
            out.push(Doc::new(id, fields));
        }
        out
    }

}

async fn post_json(
    base_url: &str,
    endpoint: &str,
    body: Value,
    target: Option<&DocumentPath>,
) -> StoreResult<Value> {
    let url = format!("{base_url}{endpoint}");
    let res = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    let status = res.status();
    if status.is_success() {
        return res
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()));
    }

    // The backend distinguishes "not found" and "already exists" from
    // transient failures; surface them as typed errors.
    let err = match (status.as_u16(), target) {
        (404, Some(doc)) => StoreError::NotFound {
            path: doc.collection.join(),
            id: doc.id.clone(),
        },
        (409, Some(doc)) => StoreError::DuplicateId {
            path: doc.collection.join(),
            id: doc.id.clone(),
        },
        _ => {
            let body = res.text().await.unwrap_or_default();
            StoreError::Backend(format!("{endpoint} ({status}): {body}"))
        }
    };
    Err(err)
}

async fn fetch_collection(
    base_url: &str,
    path: &str,
    order_field: Option<&str>,
) -> StoreResult<Vec<Doc>> {
    let data = post_json(
        base_url,
        "/api/docs/query",
        json!({"path": path, "orderBy": order_field}),
        None,
    )
    .await?;
    Ok(RemoteStore::parse_docs_response(&data))
}

#[async_trait(?Send)]
impl DocumentStore for RemoteStore {
    async fn get_all(
        &self,
        collection: &CollectionPath,
        order_field: Option<&str>,
    ) -> StoreResult<Vec<Doc>> {
        fetch_collection(&self.base_url, &collection.join(), order_field).await
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        filters: &[(&str, Value)],
    ) -> StoreResult<Vec<Doc>> {
        let clauses: Vec<Value> = filters
            .iter()
            .map(|(field, value)| json!({"field": field, "value": value}))
            .collect();

        let data = self
            .post(
                "/api/docs/query",
                json!({"path": collection.join(), "where": clauses}),
                None,
            )
            .await?;
        Ok(Self::parse_docs_response(&data))
    }

    async fn insert(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<String> {
        let data = self
            .post(
                "/api/docs/create",
                json!({"path": collection.join(), "data": fields}),
                None,
            )
            .await?;

        let id = data
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if id.trim().is_empty() {
            return Err(StoreError::Backend(format!(
                "create succeeded but response is missing the document id: {data}"
            )));
        }
        Ok(id)
    }

    async fn create_at(&self, doc: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.post(
            "/api/docs/create",
            json!({"path": doc.collection.join(), "id": doc.id, "data": fields}),
            Some(doc),
        )
        .await?;
        Ok(())
    }

    async fn merge(&self, doc: &DocumentPath, fields: Fields) -> StoreResult<()> {
        self.post(
            "/api/docs/merge",
            json!({"path": doc.collection.join(), "id": doc.id, "data": fields}),
            Some(doc),
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, doc: &DocumentPath) -> StoreResult<()> {
        self.post(
            "/api/docs/delete",
            json!({"path": doc.collection.join(), "id": doc.id}),
            Some(doc),
        )
        .await?;
        Ok(())
    }

    fn listen(
        &self,
        collection: &CollectionPath,
        order_field: Option<&str>,
        on_snapshot: SnapshotFn,
    ) -> ListenerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let last_serialized: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

        let base_url = self.base_url.clone();
        let path = collection.join();
        let order = order_field.map(|s| s.to_string());

        let tick = {
            let cancelled = cancelled.clone();
            let last_serialized = last_serialized.clone();
            move || {
                if cancelled.get() {
                    return;
                }

                let cancelled = cancelled.clone();
                let last_serialized = last_serialized.clone();
                let base_url = base_url.clone();
                let path = path.clone();
                let order = order.clone();
                let on_snapshot = on_snapshot.clone();
                spawn_local(async move {
                    match fetch_collection(&base_url, &path, order.as_deref()).await {
                        Ok(docs) => {
                            if cancelled.get() {
                                return;
                            }

                            let serialized = serialize_snapshot(&docs);
                            let changed =
                                last_serialized.borrow().as_deref() != Some(serialized.as_str());
                            if changed {
                                *last_serialized.borrow_mut() = Some(serialized);
                                on_snapshot(docs);
                            }
                        }
                        Err(err) => {
                            // Channel errors are logged, never delivered; the
                            // previous snapshot stays on screen.
                            logging::error!("watch {path}: {err}");
                        }
                    }
                });
            }
        };

        // First delivery as soon as the initial fetch resolves.
        tick();

        let Some(window) = web_sys::window() else {
            return ListenerHandle::new(move || cancelled.set(true));
        };

        let closure = wasm_bindgen::closure::Closure::wrap(Box::new(tick) as Box<dyn FnMut()>);
        let timer_id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                self.poll_ms,
            )
            .unwrap_or(0);

        ListenerHandle::new(move || {
            cancelled.set(true);
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(timer_id);
            }
            drop(closure);
        })
    }

    fn clock_ms(&self) -> i64 {
        let ms = now_ms().max(self.last_ms.get());
        self.last_ms.set(ms);
        ms
    }
}

fn serialize_snapshot(docs: &[Doc]) -> String {
    let rows: Vec<Value> = docs
        .iter()
        .map(|d| json!({"id": d.id, "fields": d.fields}))
        .collect();
    Value::Array(rows).to_string()
}
