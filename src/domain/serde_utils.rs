//! Serde utilities for payloads produced by the tracking API.

use serde::de::{self, SeqAccess, Visitor};
use serde::Deserializer;
use std::fmt;

/// Deserializes choice lists whose entries may be strings, numbers or booleans.
///
/// Every entry is converted to its string form. `null` yields `None`.
pub mod choice_list {
    use super::{de, fmt, Deserializer, SeqAccess, Visitor};

    /// Deserializes an optional list of choices.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a sequence nor null, or if an
    /// entry is a nested structure.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChoicesVisitor;

        impl<'de> Visitor<'de> for ChoicesVisitor {
            type Value = Option<Vec<String>>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a list of scalar choices or null")
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut choices = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(value) = seq.next_element::<serde_json::Value>()? {
                    let choice = match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::Bool(b) => b.to_string(),
                        serde_json::Value::Null => continue,
                        other => {
                            return Err(de::Error::custom(format!(
                                "unsupported choice value: {other}"
                            )));
                        }
                    };
                    choices.push(choice);
                }
                Ok(Some(choices))
            }
        }

        deserializer.deserialize_any(ChoicesVisitor)
    }
}
