mod app;
mod auth;
mod components;
mod models;
mod pages;
mod session;
mod state;
mod store;
mod util;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` +
// wasm-bindgen-test-runner).
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::models::Company;
    use crate::session::SessionStore;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_storage_round_trip() {
        let store = SessionStore::browser();
        store.clear();
        assert!(store.load().is_none());

        let company = Company {
            id: "co1".into(),
            name: "Mercearia Aurora".into(),
            cnpj: "12345678000199".into(),
            owner_id: "alice".into(),
        };
        store.save(&company, None);
        assert_eq!(store.load(), Some(company));

        store.clear();
        assert!(store.load().is_none());
    }

    #[wasm_bindgen_test]
    fn test_corrupt_session_storage_self_heals() {
        let storage = web_sys::window()
            .and_then(|w| w.session_storage().ok().flatten())
            .expect("sessionStorage available in the test browser");
        storage
            .set_item(crate::session::SESSION_KEY, "{broken")
            .expect("seed corrupt record");

        let store = SessionStore::browser();
        assert!(store.load().is_none());
        assert!(storage
            .get_item(crate::session::SESSION_KEY)
            .expect("get_item")
            .is_none());
    }
}
