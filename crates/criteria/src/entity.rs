use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::row::{DataType, Row};

/// Trait for types that can be extracted from result rows.
///
/// This trait is implemented for all standard Rust types that can be
/// fetched from a row (`i32`, `String`, `DateTime`, etc.).
pub trait FetchValue: Sized {
    /// Fetch a value from a row by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or the value cannot be converted to the target type.
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self>;
}

/// Declares a queryable entity with automatic `Entity` trait implementation.
///
/// Fields may be followed by `=> NAME` to generate a typed attribute constant
/// (`Entity::NAME`) for use in conditions and orderings.
///
/// # Examples
///
/// ```ignore
/// entity! {
///     table = "dogs",
///     #[derive(Debug, Clone)]
///     pub struct Dog {
///         pub id: i64 => ID,
///         pub name: String => NAME,
///         pub pet_address_id: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (@attribute $struct_name:ident, $field_name:ident, $field_type:ty) => {};

    (@attribute $struct_name:ident, $field_name:ident, $field_type:ty, $attr:ident) => {
        impl $struct_name {
            #[allow(missing_docs)]
            pub const $attr: $crate::Attribute<$struct_name, $field_type> =
                $crate::Attribute::new(stringify!($field_name));
        }
    };

    (
        table = $table:literal,
        $(#[$meta:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field_name:ident : $field_type:ty $(=> $attr:ident)?
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $struct_name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type
            ),*
        }

        impl $crate::Entity for $struct_name {
            const TABLE: &'static str = $table;

            fn projection() -> &'static [&'static str] {
                &[ $( stringify!($field_name) ),* ]
            }

            fn from_row(row: &$crate::Row) -> $crate::__private::anyhow::Result<Self> {
                Ok(Self {
                    $(
                        $field_name: <$field_type as $crate::FetchValue>::fetch(row, stringify!($field_name))?,
                    )*
                })
            }
        }

        $(
            $crate::entity!(@attribute $struct_name, $field_name, $field_type $(, $attr)?);
        )*
    };
}

/// Trait for queryable entities with metadata for query building.
///
/// Typically implemented via the `entity!` macro rather than manually.
pub trait Entity: Sized {
    /// The table name for this entity. Doubles as the root alias of queries over it.
    const TABLE: &'static str;

    /// Column names to select when fetching this entity. Attribute paths are
    /// validated against this list at compile time.
    fn projection() -> &'static [&'static str];

    /// Construct an entity instance from a result row.
    ///
    /// # Errors
    ///
    /// Returns an error if any required column is missing or cannot be converted to the expected type.
    fn from_row(row: &Row) -> Result<Self>;
}

// Inbound conversion. Engines differ in how precisely they report integer
// widths, so integral conversions accept any integral variant that fits.
impl FetchValue for bool {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_bool(row_field(row, col)?)
    }
}

impl FetchValue for i32 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_i32(row_field(row, col)?)
    }
}

impl FetchValue for i64 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_i64(row_field(row, col)?)
    }
}

impl FetchValue for u32 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_u32(row_field(row, col)?)
    }
}

impl FetchValue for u64 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_u64(row_field(row, col)?)
    }
}

impl FetchValue for f32 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_f32(row_field(row, col)?)
    }
}

impl FetchValue for f64 {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_f64(row_field(row, col)?)
    }
}

impl FetchValue for String {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_string(row_field(row, col)?)
    }
}

impl FetchValue for Vec<u8> {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_binary(row_field(row, col)?)
    }
}

impl FetchValue for DateTime<Utc> {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_timestamp(row_field(row, col)?)
    }
}

impl FetchValue for NaiveDate {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_date(row_field(row, col)?)
    }
}

impl FetchValue for serde_json::Value {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        as_json(row_field(row, col)?)
    }
}

impl<T: FetchValue> FetchValue for Option<T> {
    fn fetch(row: &Row, col: &str) -> anyhow::Result<Self> {
        match row_field(row, col) {
            Ok(field) if !field.is_null() => Ok(Some(T::fetch(row, col)?)),
            _ => Ok(None),
        }
    }
}

fn row_field<'a>(row: &'a Row, name: &str) -> Result<&'a DataType> {
    row.get(name).ok_or_else(|| anyhow!("missing column '{name}'"))
}

fn as_bool(value: &DataType) -> Result<bool> {
    match value {
        DataType::Boolean(Some(v)) => Ok(*v),
        DataType::Int32(Some(v)) => Ok(*v != 0),
        DataType::Int64(Some(v)) => Ok(*v != 0),
        _ => bail!("expected boolean data type"),
    }
}

fn as_i32(value: &DataType) -> Result<i32> {
    match value {
        DataType::Int32(Some(v)) => Ok(*v),
        DataType::Int64(Some(v)) => {
            i32::try_from(*v).map_err(|_e| anyhow!("value {v} out of range for int32"))
        }
        _ => bail!("expected int32 data type"),
    }
}

fn as_i64(value: &DataType) -> Result<i64> {
    match value {
        DataType::Int64(Some(v)) => Ok(*v),
        DataType::Int32(Some(v)) => Ok(i64::from(*v)),
        DataType::Uint32(Some(v)) => Ok(i64::from(*v)),
        _ => bail!("expected int64 data type"),
    }
}

fn as_u32(value: &DataType) -> Result<u32> {
    match value {
        DataType::Uint32(Some(v)) => Ok(*v),
        DataType::Int64(Some(v)) => {
            u32::try_from(*v).map_err(|_e| anyhow!("value {v} out of range for uint32"))
        }
        _ => bail!("expected uint32 data type"),
    }
}

fn as_u64(value: &DataType) -> Result<u64> {
    match value {
        DataType::Uint64(Some(v)) => Ok(*v),
        DataType::Uint32(Some(v)) => Ok(u64::from(*v)),
        DataType::Int64(Some(v)) => {
            u64::try_from(*v).map_err(|_e| anyhow!("value {v} out of range for uint64"))
        }
        _ => bail!("expected uint64 data type"),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_f32(value: &DataType) -> Result<f32> {
    match value {
        DataType::Float(Some(v)) => Ok(*v),
        DataType::Double(Some(v)) => Ok(*v as f32),
        _ => bail!("expected float data type"),
    }
}

fn as_f64(value: &DataType) -> Result<f64> {
    match value {
        DataType::Double(Some(v)) => Ok(*v),
        DataType::Float(Some(v)) => Ok(f64::from(*v)),
        _ => bail!("expected double data type"),
    }
}

fn as_string(value: &DataType) -> Result<String> {
    match value {
        DataType::Str(Some(raw)) => Ok(raw.clone()),
        _ => bail!("expected string data type"),
    }
}

fn as_binary(value: &DataType) -> Result<Vec<u8>> {
    match value {
        DataType::Binary(Some(bytes)) => Ok(bytes.clone()),
        _ => bail!("expected binary data type"),
    }
}

fn as_timestamp(value: &DataType) -> Result<DateTime<Utc>> {
    match value {
        DataType::Timestamp(Some(raw)) | DataType::Str(Some(raw)) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Ok(parsed.with_timezone(&Utc));
            }

            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
                return Ok(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
            }

            bail!(
                "unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format"
            )
        }
        _ => bail!("expected timestamp data type"),
    }
}

fn as_date(value: &DataType) -> Result<NaiveDate> {
    match value {
        DataType::Date(Some(raw)) | DataType::Str(Some(raw)) => {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format"))
        }
        _ => bail!("expected date data type"),
    }
}

fn as_json(value: &DataType) -> Result<serde_json::Value> {
    match value {
        DataType::Str(Some(raw)) => Ok(serde_json::from_str(raw)?),
        DataType::Binary(Some(bytes)) => Ok(serde_json::from_slice(bytes)?),
        _ => bail!("expected json compatible data type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_widening() {
        assert_eq!(as_i32(&DataType::Int64(Some(7))).unwrap(), 7);
        assert_eq!(as_i64(&DataType::Int32(Some(-3))).unwrap(), -3);
        assert_eq!(as_u64(&DataType::Int64(Some(42))).unwrap(), 42);
        assert!(as_bool(&DataType::Int64(Some(1))).unwrap());
        assert!(!as_bool(&DataType::Int64(Some(0))).unwrap());
    }

    #[test]
    fn integral_out_of_range() {
        let err = as_i32(&DataType::Int64(Some(i64::MAX))).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let err = as_u32(&DataType::Int64(Some(-1))).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn text_backed_dates() {
        let date = as_date(&DataType::Str(Some("2024-01-15".to_string()))).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let ts = as_timestamp(&DataType::Str(Some("2024-01-15T10:30:45Z".to_string()))).unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "10:30:45");
    }

    #[test]
    fn as_type_conversion_errors() {
        as_bool(&DataType::Str(Some("true".to_string()))).unwrap_err();
        as_i32(&DataType::Str(Some("not a number".to_string()))).unwrap_err();
        as_i64(&DataType::Boolean(Some(true))).unwrap_err();
        as_string(&DataType::Int32(Some(42))).unwrap_err();
        as_binary(&DataType::Str(Some("not binary".to_string()))).unwrap_err();

        let result = as_timestamp(&DataType::Timestamp(Some("invalid date".to_string())));
        assert!(result.unwrap_err().to_string().contains("unsupported timestamp"));

        as_json(&DataType::Str(Some("not json".to_string()))).unwrap_err();
    }

    #[test]
    fn optional_treats_null_and_missing_as_none() {
        let row = Row {
            index: "0".to_string(),
            fields: vec![crate::row::Field {
                name: "nickname".to_string(),
                value: DataType::Str(None),
            }],
        };

        assert_eq!(Option::<String>::fetch(&row, "nickname").unwrap(), None);
        assert_eq!(Option::<String>::fetch(&row, "absent").unwrap(), None);
    }
}
