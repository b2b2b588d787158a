//! Field adapters for `#[serde(with = "...")]`.
//!
//! chrono's own serde support writes dates as plain strings, and
//! `rust_decimal` writes numbers as strings. Routed through these modules the
//! same fields are written as Sigma temporals and exact numbers, and read back
//! only from those.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use serde::{Deserialize, Serialize};
//! use sigma::{from_value, to_value};
//!
//! #[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
//! struct Invoice {
//!     #[serde(with = "sigma::with::temporal")]
//!     issued: NaiveDate,
//!     #[serde(with = "sigma::with::temporal::option")]
//!     paid: Option<NaiveDate>,
//!     #[serde(with = "sigma::with::decimal")]
//!     total: Decimal,
//! }
//!
//! let invoice = Invoice {
//!     issued: NaiveDate::from_ymd_opt(2019, 3, 21).unwrap(),
//!     paid: None,
//!     total: Decimal::new(1250, 2),
//! };
//! let value = to_value(&invoice).unwrap();
//! assert_eq!(sigma::to_string(value.as_object().unwrap().get("total").unwrap()).unwrap(), "12.50");
//! assert_eq!(from_value::<Invoice>(value).unwrap(), invoice);
//! ```

/// Adapter for the chrono types behind each temporal flavor (see
/// [`TemporalKind`](crate::TemporalKind)).
pub mod temporal {
    use crate::temporal::{narrow, TemporalKind};
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: TemporalKind + Copy,
        S: Serializer,
    {
        value.into_temporal().serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: TemporalKind,
        D: Deserializer<'de>,
    {
        narrow(deserializer)
    }

    /// The same adapter for `Option` fields; null maps to `None`.
    pub mod option {
        use crate::temporal::TemporalKind;
        use serde::de::{self, Visitor};
        use serde::{Deserializer, Serializer};
        use std::fmt;
        use std::marker::PhantomData;

        pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: TemporalKind + Copy,
            S: Serializer,
        {
            match value {
                Some(t) => serializer.serialize_some(&t.into_temporal()),
                None => serializer.serialize_none(),
            }
        }

        struct OptionVisitor<T>(PhantomData<T>);

        impl<'de, T: TemporalKind> Visitor<'de> for OptionVisitor<T> {
            type Value = Option<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "an optional {}", T::KIND)
            }

            fn visit_none<E: de::Error>(self) -> Result<Option<T>, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Option<T>, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Option<T>, D::Error> {
                super::deserialize(deserializer).map(Some)
            }
        }

        pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: TemporalKind,
            D: Deserializer<'de>,
        {
            deserializer.deserialize_option(OptionVisitor(PhantomData))
        }
    }
}

/// Adapter that keeps a `Decimal` field an exact Sigma number.
pub mod decimal {
    use crate::value::NUMBER_TOKEN;
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal::Decimal;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(NUMBER_TOKEN, &value.to_string())
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Decimal;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a decimal number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
            Decimal::from_f64(v).ok_or_else(|| de::Error::invalid_value(de::Unexpected::Float(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
            Decimal::from_str_exact(v)
                .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Decimal, D::Error> {
            deserializer.deserialize_any(self)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_newtype_struct(NUMBER_TOKEN, DecimalVisitor)
    }
}
