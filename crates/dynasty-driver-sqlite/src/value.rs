use chrono::SecondsFormat;
use dynasty_core::{
    stmt::{self, Value as CoreValue},
    Error, Result,
};
use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    /// Converts this SQLite driver value into the core value.
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Reads column `index` of `row`, converting it to `ty` when given.
    ///
    /// SQLite's storage classes are looser than declared column types, so a
    /// DECIMAL may come back as INTEGER or REAL and a DATE as TEXT. The value
    /// is read in its storage class first and then cast.
    pub fn from_sql(row: &Row<'_>, index: usize, ty: Option<stmt::Type>) -> Result<Self> {
        let value: SqlValue = row.get(index).map_err(Error::driver_operation_failed)?;

        let core_value = match value {
            SqlValue::Null => CoreValue::Null,
            SqlValue::Integer(value) => CoreValue::I64(value),
            SqlValue::Real(value) => CoreValue::F64(value),
            SqlValue::Text(value) => CoreValue::String(value),
            SqlValue::Blob(value) => CoreValue::Bytes(value),
        };

        match ty {
            Some(ty) => Ok(Value(core_value.cast(ty)?)),
            None => Ok(Value(core_value)),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use stmt::Value;

        match &self.0 {
            Value::Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            Value::Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            Value::I32(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            Value::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            Value::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            Value::Decimal(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(v.to_string()))),
            Value::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Value::Date(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(
                v.format("%Y-%m-%d").to_string(),
            ))),
            Value::Timestamp(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(
                v.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ))),
            Value::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            Value::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
        }
    }
}
