//! Row model exchanged with query runners.

/// A nullable, typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    /// Boolean value.
    Boolean(Option<bool>),
    /// 32-bit signed integer.
    Int32(Option<i32>),
    /// 64-bit signed integer.
    Int64(Option<i64>),
    /// 32-bit unsigned integer.
    Uint32(Option<u32>),
    /// 64-bit unsigned integer.
    Uint64(Option<u64>),
    /// Single precision float.
    Float(Option<f32>),
    /// Double precision float.
    Double(Option<f64>),
    /// UTF-8 text.
    Str(Option<String>),
    /// Raw bytes.
    Binary(Option<Vec<u8>>),
    /// Date formatted as `%Y-%m-%d`.
    Date(Option<String>),
    /// Time formatted as `%H:%M:%S%.f`.
    Time(Option<String>),
    /// Timestamp, RFC 3339 or `%Y-%m-%d %H:%M:%S%.f`.
    Timestamp(Option<String>),
}

impl DataType {
    /// Returns `true` when the value is SQL `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Boolean(None)
                | Self::Int32(None)
                | Self::Int64(None)
                | Self::Uint32(None)
                | Self::Uint64(None)
                | Self::Float(None)
                | Self::Double(None)
                | Self::Str(None)
                | Self::Binary(None)
                | Self::Date(None)
                | Self::Time(None)
                | Self::Timestamp(None)
        )
    }
}

/// A named column value within a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column name as reported by the engine.
    pub name: String,
    /// Column value.
    pub value: DataType,
}

/// A single result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Position of the row in the result set.
    pub index: String,
    /// Column values in projection order.
    pub fields: Vec<Field>,
}

impl Row {
    /// Looks up a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataType> {
        self.fields.iter().find(|field| field.name == name).map(|field| &field.value)
    }
}
