use dynasty_core::{
    schema::db::{Column, ColumnRef, Index, Table, Type},
    stmt, Error, Result,
};
use rusqlite::{Connection, OptionalExtension};

/// Reads the live definition of `name` from SQLite's catalog.
pub(crate) fn describe_table(connection: &Connection, name: &str) -> Result<Option<Table>> {
    let actual: Option<String> = connection
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [name],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::driver_operation_failed)?;

    let Some(name) = actual else {
        return Ok(None);
    };

    let mut table = Table::new(&name);
    let references = foreign_keys(connection, &name)?;

    let mut stmt = connection
        .prepare(r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#)
        .map_err(Error::driver_operation_failed)?;

    let rows = stmt
        .query_map([&name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })
        .map_err(Error::driver_operation_failed)?;

    for row in rows {
        let (column, decl, not_null, default, pk) = row.map_err(Error::driver_operation_failed)?;
        let storage_ty = parse_decl_type(&decl);
        let primary_key = pk > 0;

        table.columns.push(Column {
            references: references
                .iter()
                .find(|(from, _)| from.eq_ignore_ascii_case(&column))
                .map(|(_, to)| to.clone()),
            ty: storage_ty.bridge_type(),
            auto_increment: primary_key && storage_ty == Type::Integer(4),
            storage_ty,
            nullable: !not_null && !primary_key,
            primary_key,
            default: default.as_deref().map(parse_default),
            name: column,
        });
    }

    table.indices = indices(connection, &name)?;

    Ok(Some(table))
}

pub(crate) fn list_tables(connection: &Connection) -> Result<Vec<String>> {
    let mut stmt = connection
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .map_err(Error::driver_operation_failed)?;

    let names = stmt
        .query_map([], |row| row.get(0))
        .map_err(Error::driver_operation_failed)?;

    names
        .collect::<rusqlite::Result<Vec<String>>>()
        .map_err(Error::driver_operation_failed)
}

fn foreign_keys(connection: &Connection, table: &str) -> Result<Vec<(String, ColumnRef)>> {
    let mut stmt = connection
        .prepare(r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?1)"#)
        .map_err(Error::driver_operation_failed)?;

    let rows = stmt
        .query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ColumnRef {
                    table: row.get(1)?,
                    column: row.get::<_, Option<String>>(2)?.unwrap_or_else(|| "id".to_string()),
                },
            ))
        })
        .map_err(Error::driver_operation_failed)?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::driver_operation_failed)
}

fn indices(connection: &Connection, table: &str) -> Result<Vec<Index>> {
    let mut list = connection
        .prepare(r#"SELECT name, "unique" FROM pragma_index_list(?1) WHERE origin = 'c' ORDER BY name"#)
        .map_err(Error::driver_operation_failed)?;

    let listed = list
        .query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
        })
        .map_err(Error::driver_operation_failed)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::driver_operation_failed)?;

    let mut info = connection
        .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
        .map_err(Error::driver_operation_failed)?;

    let mut indices = vec![];
    for (name, unique) in listed {
        let columns = info
            .query_map([&name], |row| row.get::<_, String>(0))
            .map_err(Error::driver_operation_failed)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::driver_operation_failed)?;

        indices.push(Index {
            name,
            columns,
            unique,
        });
    }

    Ok(indices)
}

/// Maps a declared column type back onto a storage type.
///
/// SQLite keeps the declared type text verbatim, so the types this crate
/// emits parse back exactly. Anything else is kept as a custom type.
pub(crate) fn parse_decl_type(decl: &str) -> Type {
    let decl = decl.trim().to_ascii_uppercase();

    let (base, args) = match decl.split_once('(') {
        Some((base, rest)) => (base.trim(), Some(rest.trim_end_matches(')'))),
        None => (decl.as_str(), None),
    };

    let args: Vec<u64> = args
        .map(|args| {
            args.split(',')
                .filter_map(|arg| arg.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    match (base, &args[..]) {
        ("BOOLEAN" | "BOOL", _) => Type::Boolean,
        ("TINYINT" | "SMALLINT", _) => Type::Integer(2),
        ("INTEGER" | "INT", _) => Type::Integer(4),
        ("BIGINT", _) => Type::Integer(8),
        ("DOUBLE" | "DOUBLE PRECISION" | "REAL" | "FLOAT", _) => Type::Double,
        ("NUMERIC" | "DECIMAL", [precision, scale]) => {
            Type::Numeric(Some((*precision as u32, *scale as u32)))
        }
        ("NUMERIC" | "DECIMAL", [precision]) => Type::Numeric(Some((*precision as u32, 0))),
        ("NUMERIC" | "DECIMAL", _) => Type::Numeric(None),
        ("TEXT" | "CLOB", _) => Type::Text,
        ("VARCHAR" | "CHARACTER VARYING" | "NVARCHAR", [length]) => Type::VarChar(*length),
        ("VARCHAR" | "CHARACTER VARYING" | "NVARCHAR", _) => Type::Text,
        ("BLOB", _) => Type::Blob,
        ("DATE", _) => Type::Date,
        ("TIMESTAMP" | "DATETIME", _) => Type::Timestamp,
        _ => Type::Custom(decl.clone()),
    }
}

fn parse_default(raw: &str) -> stmt::Value {
    let raw = raw.trim();

    if let Some(quoted) = raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return stmt::Value::String(quoted.replace("''", "'"));
    }

    if raw.eq_ignore_ascii_case("NULL") {
        return stmt::Value::Null;
    }

    if let Ok(value) = raw.parse::<i64>() {
        return stmt::Value::I64(value);
    }

    if let Ok(value) = raw.parse::<f64>() {
        return stmt::Value::F64(value);
    }

    stmt::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_parse_back() {
        assert_eq!(parse_decl_type("VARCHAR(32)"), Type::VarChar(32));
        assert_eq!(parse_decl_type("numeric(18, 2)"), Type::Numeric(Some((18, 2))));
        assert_eq!(parse_decl_type("BIGINT"), Type::Integer(8));
        assert_eq!(parse_decl_type("TIMESTAMP"), Type::Timestamp);
        assert_eq!(parse_decl_type("GEOMETRY"), Type::Custom("GEOMETRY".into()));
    }

    #[test]
    fn defaults_parse_back() {
        assert_eq!(parse_default("0"), stmt::Value::I64(0));
        assert_eq!(parse_default("'it''s'"), stmt::Value::from("it's"));
        assert_eq!(parse_default("NULL"), stmt::Value::Null);
    }
}
