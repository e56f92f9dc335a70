const BREAKPOINT: &str = "\n-- #[dynasty::breakpoint]\n";

/// DDL generated from a [`super::TableDiff`] by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Migration {
    Sql(String),
}

impl Migration {
    /// Create a new SQL migration from multiple SQL statements.
    /// Statements are joined with breakpoint markers.
    pub fn new_sql_with_breakpoints<S: AsRef<str>>(statements: &[S]) -> Self {
        let sql = statements
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(BREAKPOINT);
        Migration::Sql(sql)
    }

    /// Get individual SQL statements by splitting on breakpoint markers.
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Migration::Sql(sql) if sql.is_empty() => vec![],
            Migration::Sql(sql) => sql.split(BREAKPOINT).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_round_trip_through_breakpoints() {
        let migration = Migration::new_sql_with_breakpoints(&[
            "ALTER TABLE \"a\" ADD COLUMN \"b\" TEXT",
            "CREATE INDEX \"ix\" ON \"a\" (\"b\")",
        ]);
        assert_eq!(migration.statements().len(), 2);
        assert!(Migration::new_sql_with_breakpoints::<&str>(&[]).is_empty());
    }
}
