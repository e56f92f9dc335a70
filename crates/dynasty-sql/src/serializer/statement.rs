use super::{expr::ColumnNames, Comma, Formatter, Ident, Params, ToSql};

use crate::stmt::{self, Statement};

impl ToSql for &Statement {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Statement::AddColumn(stmt) => stmt.to_sql(f),
            Statement::CreateIndex(stmt) => stmt.to_sql(f),
            Statement::CreateTable(stmt) => stmt.to_sql(f),
            Statement::Delete(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::Select(stmt) => stmt.to_sql(f),
            Statement::Update(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for &stmt::CreateTable {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(
            f,
            "CREATE TABLE IF NOT EXISTS ",
            Ident(&self.name),
            " (",
            Comma(&self.columns),
            ")"
        );
    }
}

impl ToSql for &stmt::AddColumn {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(
            f,
            "ALTER TABLE ",
            Ident(&self.table),
            " ADD COLUMN ",
            &self.column
        );
    }
}

impl ToSql for &stmt::CreateIndex {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let unique = if self.unique { "UNIQUE " } else { "" };
        fmt!(
            f,
            "CREATE ",
            unique,
            "INDEX IF NOT EXISTS ",
            Ident(&self.name),
            " ON ",
            Ident(&self.on),
            " (",
            ColumnNames(&self.columns),
            ")"
        );
    }
}

impl ToSql for &stmt::Insert {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "INSERT INTO ", Ident(&self.table));

        if self.columns.is_empty() {
            fmt!(f, " DEFAULT VALUES");
        } else {
            fmt!(
                f,
                " (",
                ColumnNames(&self.columns),
                ") VALUES (",
                Comma(&self.values),
                ")"
            );
        }

        if !self.returning.is_empty() {
            fmt!(f, " RETURNING ", ColumnNames(&self.returning));
        }
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "SELECT ", Comma(&self.columns), " FROM ", &self.source);

        for join in &self.joins {
            fmt!(f, " LEFT JOIN ", &join.table, " ON ", &join.on);
        }

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ", filter);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY ", Comma(&self.order_by));
        }

        if let Some(limit) = self.limit {
            fmt!(f, " LIMIT ", limit);
        }
    }
}

impl ToSql for &stmt::Update {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "UPDATE ", Ident(&self.table), " SET ", Comma(&self.assignments));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ", filter);
        }
    }
}

impl ToSql for &stmt::Assignment {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.column), " = ", &self.value);
    }
}

impl ToSql for &stmt::Delete {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "DELETE FROM ", Ident(&self.table));

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ", filter);
        }
    }
}
