pub(crate) fn now_ms() -> i64 {
    // Browser runtime clock; native fallback is only exercised by tests.
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().round() as i64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Split free text on commas into trimmed, non-empty items.
///
/// Product `images` and `categories` are entered as comma-separated text.
pub(crate) fn split_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Coerce free-text numeric input to an integer, defaulting to 0.
///
/// Accepts plain integers and decimal text (truncated); anything else is 0,
/// so malformed input never reaches a stored document.
pub(crate) fn parse_i64_or_zero(text: &str) -> i64 {
    let t = text.trim();
    if t.is_empty() {
        return 0;
    }

    if let Ok(n) = t.parse::<i64>() {
        return n;
    }

    t.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
        .unwrap_or(0)
}

/// Render currency minor units as `R$ 12.34`.
pub(crate) fn format_brl(cents: i64) -> String {
    format!("R$ {:.2}", cents as f64 / 100.0)
}

/// Millisecond timestamp for list rows; `—` when the document has none.
pub(crate) fn format_timestamp(ms: i64) -> String {
    if ms <= 0 {
        return "—".to_string();
    }

    #[cfg(target_arch = "wasm32")]
    {
        let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(ms as f64));
        String::from(date.to_locale_string("default", &wasm_bindgen::JsValue::UNDEFINED))
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        format!("{ms}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv_trims_and_drops_empties() {
        assert_eq!(split_csv("a.jpg, b.jpg"), vec!["a.jpg", "b.jpg"]);
        assert_eq!(split_csv(" one ,, two , "), vec!["one", "two"]);
        assert!(split_csv("").is_empty());
        assert!(split_csv(" , ,").is_empty());
    }

    #[test]
    fn test_parse_i64_or_zero() {
        assert_eq!(parse_i64_or_zero("42"), 42);
        assert_eq!(parse_i64_or_zero("  7 "), 7);
        assert_eq!(parse_i64_or_zero("12.9"), 12);
        assert_eq!(parse_i64_or_zero("-3"), -3);
        assert_eq!(parse_i64_or_zero(""), 0);
        assert_eq!(parse_i64_or_zero("abc"), 0);
        assert_eq!(parse_i64_or_zero("NaN"), 0);
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0), "R$ 0.00");
        assert_eq!(format_brl(1999), "R$ 19.99");
        assert_eq!(format_brl(100), "R$ 1.00");
    }
}
