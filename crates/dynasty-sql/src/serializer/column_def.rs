use super::{value::Literal, Flavor, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = Ident(&self.name);

        if self.primary_key && self.auto_increment {
            match f.serializer.flavor {
                Flavor::Sqlite => fmt!(f, name, " INTEGER PRIMARY KEY AUTOINCREMENT"),
                Flavor::Postgresql => fmt!(
                    f,
                    name,
                    " ",
                    &self.ty,
                    " GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"
                ),
            }
            return;
        }

        fmt!(f, name, " ", &self.ty);

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        } else if !self.nullable {
            fmt!(f, " NOT NULL");
        }

        if let Some(default) = &self.default {
            fmt!(f, " DEFAULT ", Literal(default));
        }

        if let Some(references) = &self.references {
            fmt!(
                f,
                " REFERENCES ",
                Ident(&references.table),
                " (",
                Ident(&references.column),
                ")"
            );
        }
    }
}
