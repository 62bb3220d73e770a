//! Decimal-string serde adapters for big integers, for use in `#[serde(with)]`.
//!
//! Values are written as base-10 strings. On input either a string or a plain
//! JSON integer is accepted.
use num_bigint::BigUint;
use num_traits::Num;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrUint {
    String(String),
    Uint(u64),
}

impl StringOrUint {
    fn into_biguint<E: de::Error>(self) -> Result<BigUint, E> {
        match self {
            StringOrUint::String(s) => BigUint::from_str_radix(&s, 10).map_err(E::custom),
            StringOrUint::Uint(u) => Ok(BigUint::from(u)),
        }
    }
}

pub mod biguint {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_str_radix(10).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        StringOrUint::deserialize(deserializer)?.into_biguint()
    }
}

pub mod option_biguint {
    use super::*;

    pub fn serialize<S>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_some(&value.to_str_radix(10)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<StringOrUint>::deserialize(deserializer)?
            .map(StringOrUint::into_biguint)
            .transpose()
    }
}

pub mod vec_biguint {
    use super::*;

    pub fn serialize<S>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|v| v.to_str_radix(10)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<StringOrUint>::deserialize(deserializer)?
            .into_iter()
            .map(StringOrUint::into_biguint)
            .collect()
    }
}
