use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::store::{Doc, Fields, StoreError, StoreResult};
use crate::util::split_csv;

/// The authenticated tenant. Loaded once at login, held by the session
/// store, immutable for the session's lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Company {
    pub id: String,
    pub name: String,
    /// 14-digit numeric string. Historical documents sometimes store this
    /// as a JSON number; `from_doc` normalizes either form.
    pub cnpj: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
}

impl Company {
    pub fn from_doc(doc: &Doc) -> Self {
        let cnpj = match doc.get("cnpj") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.chars().filter(|c| c.is_ascii_digit()).collect(),
            _ => String::new(),
        };

        Self {
            id: doc.id.clone(),
            name: doc.get_str("name"),
            cnpj,
            owner_id: doc.get_str("ownerId"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Address {
    pub street: String,
    pub number: i64,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Address {
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::default();
        };

        Self {
            street: str_of(map, "street"),
            number: int_of(map, "number"),
            neighborhood: str_of(map, "neighborhood"),
            city: str_of(map, "city"),
            state: str_of(map, "state"),
            zip: str_of(map, "zip"),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "street": self.street.trim(),
            "number": self.number,
            "neighborhood": self.neighborhood.trim(),
            "city": self.city.trim(),
            "state": self.state.trim(),
            "zip": self.zip.trim(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.number == 0
            && [&self.street, &self.neighborhood, &self.city, &self.state, &self.zip]
                .iter()
                .all(|s| s.trim().is_empty())
    }

    /// One-line rendering for list rows, e.g.
    /// `Rua das Acácias, nº 18, Centro - Resende/RJ CEP 27511-000`.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "—".to_string();
        }

        let mut out = String::new();
        if !self.street.trim().is_empty() {
            out.push_str(self.street.trim());
        }
        if self.number > 0 {
            out.push_str(&format!(", nº {}", self.number));
        }
        if !self.neighborhood.trim().is_empty() {
            out.push_str(&format!(", {}", self.neighborhood.trim()));
        }
        if !self.city.trim().is_empty() {
            out.push_str(&format!(" - {}", self.city.trim()));
        }
        if !self.state.trim().is_empty() {
            out.push_str(&format!("/{}", self.state.trim()));
        }
        if !self.zip.trim().is_empty() {
            out.push_str(&format!(" CEP {}", self.zip.trim()));
        }
        out.trim_start_matches([',', ' ']).trim().to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub cpf: String,
    pub default_address: Address,
    pub alternate_address: Address,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Customer {
    pub fn from_doc(doc: &Doc) -> Self {
        // `shippingAddres` is a misspelling an earlier form wrote; reading
        // it here migrates those documents to the canonical key on next save.
        let shipping = doc
            .get("shippingAddress")
            .or_else(|| doc.get("shippingAddres"));

        Self {
            id: doc.id.clone(),
            name: doc.get_str("name"),
            phone: doc.get_str("phone"),
            cpf: doc.get_str("cpf"),
            default_address: Address::from_value(doc.get("defaultAddress")),
            alternate_address: Address::from_value(doc.get("alternateAddress")),
            shipping_address: Address::from_value(shipping),
            billing_address: Address::from_value(doc.get("billingAddress")),
            created_at: doc.get_i64("createdAt"),
            updated_at: doc.get_i64("updatedAt"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProductMeta {
    pub weight_grams: i64,
    pub brand: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Product {
    pub id: String,
    pub sku: String,
    pub ean: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub unit: String,
    pub images: Vec<String>,
    pub categories: Vec<String>,
    pub available_online: bool,
    pub whatsapp_catalog_id: String,
    pub visibility: String,
    pub active: bool,
    pub meta: ProductMeta,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    pub fn from_doc(doc: &Doc) -> Self {
        let meta = match doc.get("meta") {
            Some(Value::Object(map)) => ProductMeta {
                weight_grams: int_of(map, "weightGrams"),
                brand: str_of(map, "brand"),
            },
            _ => ProductMeta::default(),
        };

        Self {
            id: doc.id.clone(),
            sku: doc.get_str("sku"),
            ean: doc.get_str("ean"),
            name: doc.get_str("name"),
            description: doc.get_str("description"),
            price_cents: doc.get_i64("priceCents"),
            stock: doc.get_i64("stock"),
            unit: doc.get_str("unit"),
            images: string_list(doc.get("images")),
            categories: string_list(doc.get("categories")),
            available_online: doc.get_bool("availableOnline"),
            whatsapp_catalog_id: doc.get_str("whatsappCatalogId"),
            visibility: doc.get_str("visibility"),
            active: doc.get_bool("active"),
            meta,
            created_at: doc.get_i64("createdAt"),
            updated_at: doc.get_i64("updatedAt"),
        }
    }
}

/// Read-only order projection; this console never writes orders.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Order {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub total_cents: i64,
    pub created_at: i64,
}

impl Order {
    pub fn from_doc(doc: &Doc) -> Self {
        Self {
            id: doc.id.clone(),
            customer_id: doc.get_str("customerId"),
            status: doc.get_str("status"),
            total_cents: doc.get_i64("totalCents"),
            created_at: doc.get_i64("createdAt"),
        }
    }
}

/// Read-only cart projection.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cart {
    pub id: String,
    pub customer_id: String,
    pub status: String,
    pub created_at: i64,
}

impl Cart {
    pub fn from_doc(doc: &Doc) -> Self {
        Self {
            id: doc.id.clone(),
            customer_id: doc.get_str("customerId"),
            status: doc.get_str("status"),
            created_at: doc.get_i64("createdAt"),
        }
    }
}

/// Writable customer fields as collected from the form.
#[derive(Clone, Debug, Default)]
pub(crate) struct CustomerDraft {
    pub name: String,
    pub phone: String,
    pub cpf: String,
    pub default_address: Address,
    pub alternate_address: Address,
    pub shipping_address: Address,
    pub billing_address: Address,
}

/// Writable product fields as collected from the form. `images_text` and
/// `categories_text` stay free text until validation splits them.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProductDraft {
    pub sku: String,
    pub ean: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i64,
    pub unit: String,
    pub images_text: String,
    pub categories_text: String,
    pub available_online: bool,
    pub whatsapp_catalog_id: String,
    pub visibility: String,
    pub active: bool,
    pub weight_grams: i64,
    pub brand: String,
}

/// Entity write, tagged by kind. The gateway validates this at its boundary
/// before anything reaches the store.
#[derive(Clone, Debug)]
pub(crate) enum Draft {
    Customer(CustomerDraft),
    Product(ProductDraft),
}

impl Draft {
    pub fn validate(&self) -> StoreResult<Fields> {
        match self {
            Draft::Customer(c) => c.validate(),
            Draft::Product(p) => p.validate(),
        }
    }
}

impl CustomerDraft {
    fn validate(&self) -> StoreResult<Fields> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation("customer name is required".into()));
        }

        // All four address slots are always written, even when untouched;
        // partial address objects are not a valid document shape.
        let mut fields = Map::new();
        fields.insert("name".into(), json!(self.name.trim()));
        fields.insert("phone".into(), json!(self.phone.trim()));
        fields.insert("cpf".into(), json!(self.cpf.trim()));
        fields.insert("defaultAddress".into(), self.default_address.to_value());
        fields.insert("alternateAddress".into(), self.alternate_address.to_value());
        fields.insert("shippingAddress".into(), self.shipping_address.to_value());
        fields.insert("billingAddress".into(), self.billing_address.to_value());
        Ok(fields)
    }
}

impl ProductDraft {
    fn validate(&self) -> StoreResult<Fields> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation("product name is required".into()));
        }

        let mut fields = Map::new();
        fields.insert("sku".into(), json!(self.sku.trim()));
        fields.insert("ean".into(), json!(self.ean.trim()));
        fields.insert("name".into(), json!(self.name.trim()));
        fields.insert("description".into(), json!(self.description.trim()));
        fields.insert("priceCents".into(), json!(self.price_cents));
        fields.insert("stock".into(), json!(self.stock));
        fields.insert("unit".into(), json!(self.unit.trim()));
        fields.insert("images".into(), json!(split_csv(&self.images_text)));
        fields.insert("categories".into(), json!(split_csv(&self.categories_text)));
        fields.insert("availableOnline".into(), json!(self.available_online));
        fields.insert(
            "whatsappCatalogId".into(),
            json!(self.whatsapp_catalog_id.trim()),
        );
        fields.insert("visibility".into(), json!(self.visibility.trim()));
        fields.insert("active".into(), json!(self.active));
        fields.insert(
            "meta".into(),
            json!({"weightGrams": self.weight_grams, "brand": self.brand.trim()}),
        );
        Ok(fields)
    }
}

fn str_of(map: &Fields, key: &str) -> String {
    map.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn int_of(map: &Fields, key: &str) -> i64 {
    match map.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_draft_requires_name() {
        let err = Draft::Customer(CustomerDraft::default())
            .validate()
            .expect_err("empty name must fail validation");
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_customer_draft_writes_all_four_address_slots() {
        // Only the name filled in: every slot still lands in the payload.
        let fields = Draft::Customer(CustomerDraft {
            name: "Jane".into(),
            ..Default::default()
        })
        .validate()
        .expect("draft should validate");

        for slot in [
            "defaultAddress",
            "alternateAddress",
            "shippingAddress",
            "billingAddress",
        ] {
            let addr = fields.get(slot).and_then(|v| v.as_object()).expect(slot);
            assert_eq!(addr.get("number"), Some(&json!(0)));
            assert_eq!(addr.get("street"), Some(&json!("")));
        }
        assert_eq!(fields.get("phone"), Some(&json!("")));
    }

    #[test]
    fn test_product_draft_splits_csv_lists() {
        // Free text in, trimmed lists out.
        let fields = Draft::Product(ProductDraft {
            name: "Café".into(),
            images_text: "a.jpg, b.jpg".into(),
            categories_text: " mercearia ,, bebidas ".into(),
            ..Default::default()
        })
        .validate()
        .expect("draft should validate");

        assert_eq!(fields.get("images"), Some(&json!(["a.jpg", "b.jpg"])));
        assert_eq!(
            fields.get("categories"),
            Some(&json!(["mercearia", "bebidas"]))
        );
        assert_eq!(fields.get("priceCents"), Some(&json!(0)));
    }

    #[test]
    fn test_customer_from_doc_accepts_legacy_shipping_key() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Helena"));
        fields.insert(
            "shippingAddres".into(),
            json!({"street": "Rua A", "number": 3}),
        );
        let customer = Customer::from_doc(&Doc::new("c1", fields));

        assert_eq!(customer.shipping_address.street, "Rua A");
        assert_eq!(customer.shipping_address.number, 3);
        assert!(customer.billing_address.is_empty());
    }

    #[test]
    fn test_company_from_doc_normalizes_numeric_cnpj() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Mercearia"));
        fields.insert("cnpj".into(), json!(12345678000199i64));
        fields.insert("ownerId".into(), json!("alice"));

        let company = Company::from_doc(&Doc::new("co1", fields));
        assert_eq!(company.cnpj, "12345678000199");
        assert_eq!(company.owner_id, "alice");
    }

    #[test]
    fn test_address_summary() {
        let addr = Address {
            street: "Rua das Acácias".into(),
            number: 18,
            neighborhood: "Centro".into(),
            city: "Resende".into(),
            state: "RJ".into(),
            zip: "27511-000".into(),
        };
        assert_eq!(
            addr.summary(),
            "Rua das Acácias, nº 18, Centro - Resende/RJ CEP 27511-000"
        );
        assert_eq!(Address::default().summary(), "—");
    }

    #[test]
    fn test_product_from_doc_tolerates_missing_fields() {
        let product = Product::from_doc(&Doc::new("p1", Map::new()));
        assert_eq!(product.price_cents, 0);
        assert_eq!(product.stock, 0);
        assert!(product.images.is_empty());
        assert_eq!(product.meta.weight_grams, 0);
    }
}
