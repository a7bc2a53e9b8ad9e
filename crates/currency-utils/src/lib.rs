use screener_core::CurrencyRateTable;
use serde_json::Value;

/// Currency aliases collapsed before any table lookup. Offshore and
/// onshore RMB are treated the same for NCAV work.
const CURRENCY_ALIASES: &[(&str, &str)] = &[("RMB", "CNY"), ("CNH", "CNY")];

/// Coerce a loose JSON value to a finite float.
///
/// Nulls, blank strings, "nan"/"none" markers and anything unparseable
/// come back as `None`. Never panics.
pub fn safe_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => safe_number_str(s),
        _ => None,
    }
}

fn safe_number_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower == "nan" || lower == "none" {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Handle `{"val": 123.0, "unit": "CNY"}` wrappers as well as bare
/// numbers or numeric strings.
pub fn extract_val(raw: &Value) -> Option<f64> {
    if let Value::Object(map) = raw {
        if let Some(inner) = map.get("val") {
            return safe_number(inner);
        }
    }
    safe_number(raw)
}

/// Uppercase a currency code and collapse known aliases.
pub fn normalize_currency(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    for (alias, canonical) in CURRENCY_ALIASES {
        if upper == *alias {
            return (*canonical).to_string();
        }
    }
    upper
}

/// Build a rate table from a raw code -> USD-per-unit mapping,
/// normalizing keys. On alias collisions the last write wins.
pub fn normalize_rates<I, S>(raw: I) -> CurrencyRateTable
where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
{
    let mut table = CurrencyRateTable::default();
    for (code, rate) in raw {
        table.insert(normalize_currency(code.as_ref()), rate);
    }
    table
}

/// Convert `amount` from one currency to another via the USD pivot.
///
/// The table stores USD per one unit of each code, so going into a
/// foreign target divides by that unit's USD value. Any missing piece
/// (amount, code, rate) yields `None`.
pub fn convert_between(
    amount: Option<f64>,
    from_ccy: Option<&str>,
    to_ccy: Option<&str>,
    rates: &CurrencyRateTable,
) -> Option<f64> {
    let amount = amount?;
    let from = normalize_currency(from_ccy?);
    let to = normalize_currency(to_ccy?);

    if from == to {
        return Some(amount);
    }

    let usd_value = amount * rates.usd_per_unit(&from)?;
    if to == "USD" {
        return Some(usd_value);
    }

    let usd_per_target = rates.usd_per_unit(&to)?;
    Some(usd_value / usd_per_target)
}
