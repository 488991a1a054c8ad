use serde::{Deserialize, Deserializer};

/// Splits a comma-separated field such as `"python, pandas"` into trimmed,
/// non-empty entries.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrVec {
    String(String),
    Vec(Vec<String>),
}

/// Accepts tags either as a list or as one comma-separated string. `null`
/// and a missing key both read as `None`.
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrVec>::deserialize(deserializer)? {
        Some(StringOrVec::String(s)) => Some(split_tags(&s)),
        Some(StringOrVec::Vec(v)) => Some(v),
        None => None,
    })
}

/// HTML checkboxes are only submitted when ticked.
pub fn checkbox(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| v != "false" && v != "off")
}
