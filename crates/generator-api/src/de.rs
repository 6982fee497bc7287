//! Deserialization helpers.

use serde::{Deserialize, Deserializer};

/// Reads an explicit `null` as the field's default, the same as an absent
/// field. Pair with `#[serde(default)]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
