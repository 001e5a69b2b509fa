use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::SqlWriter;
use sea_query::{BinOper, Oper, Quote, SimpleExpr, SubQueryStatement, Value, Values};

use crate::error::{CriteriaError, Result};
use crate::row::DataType;

/// A rendered statement: SQL text plus its bound parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<DataType>,
}

/// ``SeaQuery`` backend rendering criteria statements.
#[derive(Clone, Copy)]
pub struct QueryBuilder {
    /// Identifier quote.
    pub quote: Quote,
    /// Placeholder prefix, `?` or `$`.
    pub placeholder: &'static str,
    /// `false` for `?`, `true` for `$1, $2, ...`.
    pub numbered: bool,
}

impl QueryBuilder {
    /// Unnumbered `?` placeholders, as expected by positional drivers.
    #[must_use]
    pub fn positional() -> Self {
        Self {
            quote: Quote::new(b'"'),
            placeholder: "?",
            numbered: false,
        }
    }
}

impl Default for QueryBuilder {
    // works for `Postgres` and `Sqlite`
    fn default() -> Self {
        Self {
            quote: Quote::new(b'"'),
            placeholder: "$",
            numbered: true,
        }
    }
}

impl QuotedBuilder for QueryBuilder {
    fn quote(&self) -> Quote {
        self.quote
    }
}

impl EscapeBuilder for QueryBuilder {}

impl TableRefBuilder for QueryBuilder {}

impl OperLeftAssocDecider for QueryBuilder {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // same set as sea-query 0.32 `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

impl PrecedenceDecider for QueryBuilder {
    fn inner_expr_well_known_greater_precedence(
        &self, _inner: &SimpleExpr, _outer_oper: &Oper,
    ) -> bool {
        // always parenthesize nested AND/OR groups
        false
    }
}

impl sea_query::backend::QueryBuilder for QueryBuilder {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        (self.placeholder, self.numbered)
    }
}

/// Converts bound statement values into the row model.
///
/// # Errors
///
/// Returns [`CriteriaError::UnsupportedValue`] for values without a row-model
/// counterpart.
pub fn values_to_datatypes(values: Values) -> Result<Vec<DataType>> {
    values.into_iter().map(value_to_datatype).collect()
}

fn value_to_datatype(value: Value) -> Result<DataType> {
    let data_type = match value {
        Value::Bool(v) => DataType::Boolean(v),
        Value::TinyInt(v) => DataType::Int32(v.map(i32::from)),
        Value::SmallInt(v) => DataType::Int32(v.map(i32::from)),
        Value::Int(v) => DataType::Int32(v),
        Value::BigInt(v) => DataType::Int64(v),
        Value::TinyUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::SmallUnsigned(v) => DataType::Uint32(v.map(u32::from)),
        Value::Unsigned(v) => DataType::Uint32(v),
        Value::BigUnsigned(v) => DataType::Uint64(v),
        Value::Float(v) => DataType::Float(v),
        Value::Double(v) => DataType::Double(v),
        Value::String(v) => DataType::Str(v.map(|value| *value)),
        Value::Char(v) => DataType::Str(v.map(|ch| ch.to_string())),
        Value::Bytes(v) => DataType::Binary(v.map(|bytes| *bytes)),
        Value::ChronoDate(v) => DataType::Date(v.map(|date| date.to_string())),
        Value::ChronoTime(v) => DataType::Time(v.map(|time| time.to_string())),
        Value::ChronoDateTime(v) => DataType::Timestamp(v.map(|dt| dt.to_string())),
        Value::ChronoDateTimeUtc(v) => DataType::Timestamp(v.map(|dt| dt.to_rfc3339())),
        other => return Err(CriteriaError::UnsupportedValue(format!("{other:?}"))),
    };
    Ok(data_type)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn converts_common_values() {
        let values = Values(vec![
            Value::from(true),
            Value::from(7_i16),
            Value::from(9_i64),
            Value::from("rex"),
            Value::from(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            Value::String(None),
        ]);

        let params = values_to_datatypes(values).unwrap();
        assert_eq!(
            params,
            vec![
                DataType::Boolean(Some(true)),
                DataType::Int32(Some(7)),
                DataType::Int64(Some(9)),
                DataType::Str(Some("rex".to_string())),
                DataType::Date(Some("2024-01-15".to_string())),
                DataType::Str(None),
            ]
        );
    }

    #[test]
    fn rejects_unsupported_values() {
        let values = Values(vec![Value::ChronoDateTimeLocal(None)]);
        let err = values_to_datatypes(values).unwrap_err();
        assert!(matches!(err, CriteriaError::UnsupportedValue(_)));
    }
}
