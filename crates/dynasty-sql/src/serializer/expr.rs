use super::{Comma, Delimited, Formatter, Ident, Params, ToSql};

use dynasty_core::stmt::{self, Expr};

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::And(operands) if operands.is_empty() => fmt!(f, "1 = 1"),
            Expr::And(operands) => fmt!(f, "(", Delimited(operands, " AND "), ")"),
            Expr::Or(operands) if operands.is_empty() => fmt!(f, "1 = 0"),
            Expr::Or(operands) => fmt!(f, "(", Delimited(operands, " OR "), ")"),
            Expr::BinaryOp(expr) => {
                let op = expr.op.to_string();
                fmt!(f, &*expr.lhs, " ", op.as_str(), " ", &*expr.rhs)
            }
            Expr::Column(column) => fmt!(f, column),
            Expr::CountStar => fmt!(f, "COUNT(*)"),
            Expr::IsNull(expr) => {
                let test = if expr.negate {
                    " IS NOT NULL"
                } else {
                    " IS NULL"
                };
                fmt!(f, &*expr.expr, test)
            }
            Expr::Like(expr) => fmt!(f, &*expr.expr, " LIKE ", &*expr.pattern),
            Expr::Not(expr) => fmt!(f, "NOT (", &**expr, ")"),
            Expr::Value(value) => {
                let placeholder = f.params.push(value);
                fmt!(f, placeholder)
            }
        }
    }
}

impl ToSql for &stmt::ExprColumn {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if let Some(table) = &self.table {
            fmt!(f, Ident(table), ".");
        }
        fmt!(f, Ident(&self.name));
    }
}

impl ToSql for &stmt::TableRef {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.name));
        if let Some(alias) = &self.alias {
            fmt!(f, " AS ", Ident(alias));
        }
    }
}

impl ToSql for &stmt::OrderByExpr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, &self.expr);
        match self.order {
            Some(stmt::Direction::Asc) => fmt!(f, " ASC"),
            Some(stmt::Direction::Desc) => fmt!(f, " DESC"),
            None => {}
        }
    }
}

/// Comma separated quoted column names.
pub(super) struct ColumnNames<'a>(pub(super) &'a [String]);

impl ToSql for ColumnNames<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Comma(self.0.iter().map(Ident)));
    }
}
