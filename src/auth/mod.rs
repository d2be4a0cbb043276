//! Login by CNPJ + owner id against the `companies` collection.
//!
//! Historical data entry left `cnpj` stored as a number in some documents
//! and as a digit string in others, so the lookup is an explicit two-step
//! probe: numeric equality first, then the digit string. Collapsing this
//! into one query would silently drop whichever form the backend can't
//! index.

use std::rc::Rc;

use serde_json::json;

use crate::models::Company;
use crate::store::path::CollectionPath;
use crate::store::{DocumentStore, StoreError};

pub(crate) const COMPANIES_PATH: &str = "companies";

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub(crate) enum AuthError {
    #[error("Fill in both fields.")]
    MissingFields,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Unexpected error while signing in — check the console logs.")]
    Store(#[from] StoreError),
}

/// Strip everything but digits: `"12.345.678/0001-99"` → `"12345678000199"`.
pub(crate) fn normalize_cnpj(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Render a CNPJ as `NN.NNN.NNN/NNNN-NN`, left-padding short values.
pub(crate) fn format_cnpj(raw: &str) -> String {
    let digits = normalize_cnpj(raw);
    if digits.is_empty() {
        return "—".to_string();
    }

    let padded = format!("{digits:0>14}");
    format!(
        "{}.{}.{}/{}-{}",
        &padded[0..2],
        &padded[2..5],
        &padded[5..8],
        &padded[8..12],
        &padded[12..14]
    )
}

pub(crate) async fn authenticate(
    store: &Rc<dyn DocumentStore>,
    cnpj_raw: &str,
    owner_id: &str,
) -> Result<Company, AuthError> {
    let cnpj = normalize_cnpj(cnpj_raw.trim());
    let owner_id = owner_id.trim();
    if cnpj.is_empty() || owner_id.is_empty() {
        return Err(AuthError::MissingFields);
    }

    let companies = CollectionPath::parse(COMPANIES_PATH)?;

    // 1) Numeric probe.
    if let Ok(numeric) = cnpj.parse::<i64>() {
        let docs = store
            .query_eq(
                &companies,
                &[("cnpj", json!(numeric)), ("ownerId", json!(owner_id))],
            )
            .await?;
        if let Some(doc) = docs.first() {
            return Ok(Company::from_doc(doc));
        }
    }

    // 2) Digit-string probe.
    let docs = store
        .query_eq(
            &companies,
            &[("cnpj", json!(cnpj)), ("ownerId", json!(owner_id))],
        )
        .await?;

    match docs.first() {
        Some(doc) => Ok(Company::from_doc(doc)),
        None => Err(AuthError::InvalidCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use futures::executor::block_on;

    fn store_with_company(cnpj: serde_json::Value) -> Rc<dyn DocumentStore> {
        let store = MemoryStore::new();
        let doc = CollectionPath::parse("companies")
            .expect("path")
            .doc("co1")
            .expect("doc path");
        let mut fields = serde_json::Map::new();
        fields.insert("name".into(), json!("Mercearia Aurora"));
        fields.insert("cnpj".into(), cnpj);
        fields.insert("ownerId".into(), json!("alice"));
        block_on(store.create_at(&doc, fields)).expect("seed company");
        Rc::new(store)
    }

    #[test]
    fn test_login_succeeds_via_numeric_probe() {
        // The document stores cnpj as a number; the user types
        // the formatted string.
        let store = store_with_company(json!(12345678000199i64));
        let company = block_on(authenticate(&store, "12.345.678/0001-99", "alice"))
            .expect("login should succeed");
        assert_eq!(company.id, "co1");
        assert_eq!(company.cnpj, "12345678000199");
    }

    #[test]
    fn test_login_succeeds_via_string_probe() {
        let store = store_with_company(json!("12345678000199"));
        let company =
            block_on(authenticate(&store, "12345678000199", "alice")).expect("login should succeed");
        assert_eq!(company.name, "Mercearia Aurora");
    }

    #[test]
    fn test_login_missing_fields() {
        let store = store_with_company(json!(1i64));
        assert_eq!(
            block_on(authenticate(&store, "  ", "alice")),
            Err(AuthError::MissingFields)
        );
        assert_eq!(
            block_on(authenticate(&store, "123", "")),
            Err(AuthError::MissingFields)
        );
        // Non-digit noise normalizes to empty.
        assert_eq!(
            block_on(authenticate(&store, "abc", "alice")),
            Err(AuthError::MissingFields)
        );
    }

    #[test]
    fn test_login_wrong_owner_is_invalid_credentials() {
        let store = store_with_company(json!(12345678000199i64));
        assert_eq!(
            block_on(authenticate(&store, "12345678000199", "bob")),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("12345678000199"), "12.345.678/0001-99");
        assert_eq!(format_cnpj("12.345.678/0001-99"), "12.345.678/0001-99");
        assert_eq!(format_cnpj("199"), "00.000.000/0001-99");
        assert_eq!(format_cnpj(""), "—");
        assert_eq!(format_cnpj("no digits"), "—");
    }
}
