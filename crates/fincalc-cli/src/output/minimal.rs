use serde_json::Value;

/// Headline field of each calculator, in lookup order
const HEADLINE_KEYS: [&str; 12] = [
    "overseas_quota",
    "normal_payment",
    "final_value",
    "irr_pct",
    "break_even_price",
    "net_income",
    "net_profit",
    "fire_number",
    "coverage_gap",
    "real_value",
    "converted",
    "verdict",
];

/// Print just the headline answer, falling back to the first result field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match headline(result) {
        Some((None, val)) => println!("{}", format_minimal(val)),
        Some((Some(key), val)) => println!("{}: {}", key, format_minimal(val)),
        None => println!("{}", format_minimal(result)),
    }
}

/// The headline value, with its key when it came from the fallback
fn headline(result: &Value) -> Option<(Option<&str>, &Value)> {
    let map = result.as_object()?;
    HEADLINE_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).map(|v| (None, v)))
        .or_else(|| map.iter().next().map(|(k, v)| (Some(k.as_str()), v)))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
