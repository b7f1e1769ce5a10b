//! Serde helpers for partial updates.

use serde::{Deserialize, Deserializer};

/// Deserialize a present field into `Some(value)`, including `null`.
///
/// Used with `#[serde(default, deserialize_with = "deserialize_some")]` on
/// `Option<Option<T>>` fields: an absent field stays `None` (leave unchanged),
/// `null` becomes `Some(None)` (clear) and a value becomes `Some(Some(v))`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_some")]
        telephone: Option<Option<String>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"telephone": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"telephone": "0600000000"}"#).unwrap();

        assert_eq!(absent.telephone, None);
        assert_eq!(null.telephone, Some(None));
        assert_eq!(value.telephone, Some(Some("0600000000".to_string())));
    }
}
