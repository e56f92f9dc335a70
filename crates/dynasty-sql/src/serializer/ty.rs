use super::{Flavor, Params, ToSql};

use dynasty_core::schema::db;

impl ToSql for &db::Type {
    fn to_sql<T: Params>(self, f: &mut super::Formatter<'_, T>) {
        use std::fmt::Write;

        let flavor = f.serializer.flavor;
        let _ = match self {
            db::Type::Boolean => write!(f.dst, "BOOLEAN"),
            db::Type::Integer(1..=2) => write!(f.dst, "SMALLINT"),
            db::Type::Integer(3..=4) => write!(f.dst, "INTEGER"),
            db::Type::Integer(_) => write!(f.dst, "BIGINT"),
            db::Type::Double => match flavor {
                Flavor::Postgresql => write!(f.dst, "DOUBLE PRECISION"),
                Flavor::Sqlite => write!(f.dst, "DOUBLE"),
            },
            db::Type::Numeric(None) => write!(f.dst, "NUMERIC"),
            db::Type::Numeric(Some((precision, scale))) => {
                write!(f.dst, "NUMERIC({precision}, {scale})")
            }
            db::Type::Text => write!(f.dst, "TEXT"),
            db::Type::VarChar(size) => write!(f.dst, "VARCHAR({size})"),
            db::Type::Blob => match flavor {
                Flavor::Postgresql => write!(f.dst, "BYTEA"),
                Flavor::Sqlite => write!(f.dst, "BLOB"),
            },
            db::Type::Date => write!(f.dst, "DATE"),
            db::Type::Timestamp => match flavor {
                Flavor::Postgresql => write!(f.dst, "TIMESTAMP WITH TIME ZONE"),
                Flavor::Sqlite => write!(f.dst, "TIMESTAMP"),
            },
            db::Type::Custom(custom) => write!(f.dst, "{custom}"),
        };
    }
}
