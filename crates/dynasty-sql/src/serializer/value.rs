use super::{Flavor, Formatter, Params, ToSql};

use dynasty_core::stmt::Value;

/// A value written inline, as DDL defaults must be.
pub(super) struct Literal<'a>(pub(super) &'a Value);

impl ToSql for Literal<'_> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        use std::fmt::Write;

        let flavor = f.serializer.flavor;
        let _ = match self.0 {
            Value::Null => write!(f.dst, "NULL"),
            Value::Bool(v) => match flavor {
                Flavor::Postgresql => write!(f.dst, "{}", if *v { "TRUE" } else { "FALSE" }),
                Flavor::Sqlite => write!(f.dst, "{}", *v as u8),
            },
            Value::I32(v) => write!(f.dst, "{v}"),
            Value::I64(v) => write!(f.dst, "{v}"),
            Value::F64(v) => write!(f.dst, "{v:?}"),
            Value::Decimal(v) => write!(f.dst, "{v}"),
            Value::String(v) => {
                quoted(f.dst, v);
                Ok(())
            }
            Value::Date(v) => {
                quoted(f.dst, &v.format("%Y-%m-%d").to_string());
                Ok(())
            }
            Value::Timestamp(v) => {
                quoted(f.dst, &v.to_rfc3339());
                Ok(())
            }
            Value::Bytes(v) => {
                let hex: String = v.iter().map(|b| format!("{b:02X}")).collect();
                match flavor {
                    Flavor::Postgresql => write!(f.dst, "'\\x{hex}'"),
                    Flavor::Sqlite => write!(f.dst, "X'{hex}'"),
                }
            }
        };
    }
}

fn quoted(dst: &mut String, s: &str) {
    dst.push('\'');
    for c in s.chars() {
        if c == '\'' {
            dst.push('\'');
        }
        dst.push(c);
    }
    dst.push('\'');
}
