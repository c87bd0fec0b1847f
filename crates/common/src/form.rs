//! Lenient field deserializers.
//!
//! Multipart bodies deliver every value as text, so input structs accept
//! either the typed JSON value or its textual form. Blank text counts as
//! absent. Use with `#[serde(default, deserialize_with = "...")]`.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose<T> {
    Typed(T),
    Text(String),
}

/// Parses the textual booleans sent by HTML forms.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn from_loose<T, E>(value: Option<Loose<T>>) -> Result<Option<T>, E>
where
    T: FromStr,
    T::Err: Display,
    E: de::Error,
{
    match value {
        None => Ok(None),
        Some(Loose::Typed(v)) => Ok(Some(v)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => s.trim().parse().map(Some).map_err(E::custom),
    }
}

/// `Option<bool>` from a boolean or its textual form.
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose<bool>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Typed(v)) => Ok(Some(v)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => parse_bool(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("\"{s}\" is not a valid boolean"))),
    }
}

/// `Option<T>` for numbers, decimals and timestamps given as value or text.
pub fn opt_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    from_loose(Option::<Loose<T>>::deserialize(deserializer)?)
}

/// `Option<Option<T>>` for nullable fields of partial updates.
///
/// A missing field stays `None` through `#[serde(default)]`; an explicit null
/// or blank text becomes `Some(None)`.
pub fn nullable_value<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    from_loose(Option::<Loose<T>>::deserialize(deserializer)?).map(Some)
}

/// `Option<Option<String>>` for nullable text fields of partial updates.
pub fn nullable_text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(Some(text.filter(|s| !s.trim().is_empty())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Input {
        #[serde(default, deserialize_with = "opt_bool")]
        is_active: Option<bool>,
        #[serde(default, deserialize_with = "opt_value")]
        order: Option<i32>,
        #[serde(default, deserialize_with = "nullable_value")]
        place: Option<Option<i64>>,
        #[serde(default, deserialize_with = "nullable_text")]
        cta_url: Option<Option<String>>,
    }

    #[test]
    fn test_accepts_typed_json() {
        let input: Input =
            serde_json::from_value(json!({"is_active": false, "order": 3, "place": 7})).unwrap();
        assert_eq!(input.is_active, Some(false));
        assert_eq!(input.order, Some(3));
        assert_eq!(input.place, Some(Some(7)));
        assert_eq!(input.cta_url, None);
    }

    #[test]
    fn test_accepts_form_text() {
        let input: Input = serde_json::from_value(
            json!({"is_active": "on", "order": " 12 ", "place": "", "cta_url": ""}),
        )
        .unwrap();
        assert_eq!(input.is_active, Some(true));
        assert_eq!(input.order, Some(12));
        assert_eq!(input.place, Some(None));
        assert_eq!(input.cta_url, Some(None));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_value::<Input>(json!({"is_active": "maybe"})).is_err());
        assert!(serde_json::from_value::<Input>(json!({"order": "three"})).is_err());
    }
}
