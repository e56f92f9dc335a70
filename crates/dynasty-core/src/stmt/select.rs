use super::{Expr, OrderByExpr, TableRef};

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// The main table being queried
    pub source: TableRef,

    /// `LEFT JOIN`s used to surface fields of referenced rows
    pub joins: Vec<Join>,

    /// Projected expressions, in result column order
    pub columns: Vec<Expr>,

    /// `WHERE` clause
    pub filter: Option<Expr>,

    pub order_by: Vec<OrderByExpr>,

    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

impl Select {
    pub fn new(source: TableRef, columns: Vec<Expr>) -> Self {
        Self {
            source,
            joins: vec![],
            columns,
            filter: None,
            order_by: vec![],
            limit: None,
        }
    }

    pub fn and_filter(&mut self, expr: impl Into<Expr>) {
        self.filter = Some(match self.filter.take() {
            Some(filter) => Expr::and(filter, expr),
            None => expr.into(),
        });
    }
}
