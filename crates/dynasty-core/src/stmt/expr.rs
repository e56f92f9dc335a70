use super::{BinaryOp, ExprBinaryOp, ExprColumn, ExprIsNull, ExprLike, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All of the expressions must hold. An empty list is `true`.
    And(Vec<Expr>),

    /// Binary comparison
    BinaryOp(ExprBinaryOp),

    /// A column, optionally qualified by a table alias
    Column(ExprColumn),

    /// `COUNT(*)`
    CountStar,

    /// `IS NULL` / `IS NOT NULL`
    IsNull(ExprIsNull),

    /// SQL `LIKE` pattern match
    Like(ExprLike),

    /// Negation
    Not(Box<Expr>),

    /// Any of the expressions must hold
    Or(Vec<Expr>),

    /// A literal value, bound as a statement parameter
    Value(Value),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        ExprColumn::new(None, name).into()
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        ExprColumn::new(Some(table.into()), name).into()
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn binary_op(lhs: impl Into<Expr>, op: BinaryOp, rhs: impl Into<Expr>) -> Self {
        ExprBinaryOp {
            lhs: Box::new(lhs.into()),
            op,
            rhs: Box::new(rhs.into()),
        }
        .into()
    }

    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn ne(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Self::binary_op(lhs, BinaryOp::Ne, rhs)
    }

    pub fn is_null(expr: impl Into<Expr>) -> Self {
        ExprIsNull {
            expr: Box::new(expr.into()),
            negate: false,
        }
        .into()
    }

    pub fn is_not_null(expr: impl Into<Expr>) -> Self {
        ExprIsNull {
            expr: Box::new(expr.into()),
            negate: true,
        }
        .into()
    }

    pub fn like(expr: impl Into<Expr>, pattern: impl Into<Expr>) -> Self {
        ExprLike {
            expr: Box::new(expr.into()),
            pattern: Box::new(pattern.into()),
        }
        .into()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: impl Into<Expr>) -> Self {
        Self::Not(Box::new(expr.into()))
    }

    /// Conjunction of `lhs` and `rhs`, flattening nested `And`s.
    pub fn and(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        let mut operands = vec![];
        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Expr::And(inner) => operands.extend(inner),
                expr => operands.push(expr),
            }
        }
        Self::and_from_vec(operands)
    }

    pub fn and_from_vec(mut operands: Vec<Expr>) -> Self {
        if operands.len() == 1 {
            return operands.remove(0);
        }
        Self::And(operands)
    }

    pub fn or_from_vec(mut operands: Vec<Expr>) -> Self {
        if operands.len() == 1 {
            return operands.remove(0);
        }
        Self::Or(operands)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Expr::And(operands) if operands.is_empty())
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}
