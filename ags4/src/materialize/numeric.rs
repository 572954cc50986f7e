//! Codes de type AGS numériques et coercition des valeurs

/// Indique si un code de type AGS désigne une colonne numérique
///
/// Reconnus : `0DP`..`6DP`, `MC`, `SF`/`nSF`, `SCI`/`nSCI`, `2NO`..`4NO`.
pub fn is_numeric_type(code: &str) -> bool {
    let code = code.trim().to_ascii_uppercase();
    if code == "MC" {
        return true;
    }
    if let Some(prefix) = code.strip_suffix("DP") {
        return matches!(prefix, "0" | "1" | "2" | "3" | "4" | "5" | "6");
    }
    if let Some(prefix) = code.strip_suffix("NO") {
        return matches!(prefix, "2" | "3" | "4");
    }
    if let Some(prefix) = code
        .strip_suffix("SCI")
        .or_else(|| code.strip_suffix("SF"))
    {
        return prefix.bytes().all(|b| b.is_ascii_digit());
    }
    false
}

/// Convertit une valeur brute en nombre (None si vide ou invalide)
pub fn coerce(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    fast_float::parse::<f64, _>(value)
        .ok()
        .filter(|v| v.is_finite())
}
