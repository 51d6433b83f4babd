use serde_json::Value;

/// Coerce a stored value into a float.
///
/// Anything that is not a finite number (or a string holding one) is
/// "no value": null, missing keys, blanks, placeholders such as `"N/S"`,
/// booleans and nested objects all map to `None`. Never zero.
pub fn to_float_or_none(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };

    parsed.filter(|v| v.is_finite())
}

/// Normalize a time-of-day string to zero-padded `HH:MM`.
///
/// Accepts `14:05:00`, `14:5`, and full timestamps like `2024-01-01 14:05`.
/// Strings that do not look like `H:M` come back trimmed but otherwise
/// untouched.
pub fn normalize_time(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let clock = trimmed.rsplit(' ').next().unwrap_or(trimmed);

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() >= 2 {
        if let (Ok(h), Ok(m)) = (parts[0].trim().parse::<u32>(), parts[1].trim().parse::<u32>()) {
            return format!("{h:02}:{m:02}");
        }
    }

    clock.to_string()
}

/// Read a stored time field into its normalized form; blanks become `None`.
pub fn time_of(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let normalized = normalize_time(&raw);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Round to two decimals, the precision used on every report sheet.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
