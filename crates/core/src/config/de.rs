//! Lenient deserializers for values that may arrive from environment variables.
//!
//! Environment values that look numeric (a SKU, a zip code, a phone number)
//! are handed to serde as numbers, so string fields accept both forms.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Signed(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarList {
    One(Scalar),
    Many(Vec<Scalar>),
}

pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

/// Accepts `"a,b"`, `123`, or `["a", 123]`. Blank entries are dropped.
pub fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<String> = match ScalarList::deserialize(deserializer)? {
        ScalarList::One(scalar) => scalar
            .into_string()
            .split(',')
            .map(str::to_string)
            .collect(),
        ScalarList::Many(list) => list.into_iter().map(Scalar::into_string).collect(),
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
