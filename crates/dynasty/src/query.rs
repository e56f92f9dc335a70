use crate::registry::{EntityType, PropertyKind};

use dynasty_core::{
    stmt::{BinaryOp, Direction, Expr, OrderByExpr, Value},
    Error, Result,
};

/// Criteria, ordering and limit for listing, counting and bulk deletes.
///
/// A query with no restrictions is rejected unless
/// [`ignore_empty_criteria`](Query::ignore_empty_criteria) is set, so an
/// accidental empty filter never reads or deletes a whole table.
#[derive(Debug, Clone, Default)]
pub struct Query {
    restrictions: Vec<Restriction>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    ignore_empty_criteria: bool,
}

#[derive(Debug, Clone)]
enum Restriction {
    Compare {
        property: String,
        op: BinaryOp,
        value: Value,
    },
    IsNull {
        property: String,
        negate: bool,
    },
    Like {
        property: String,
        pattern: String,
    },
}

impl Query {
    pub fn new() -> Query {
        Query::default()
    }

    /// A query that matches every record.
    pub fn all() -> Query {
        Query::new().ignore_empty_criteria(true)
    }

    pub fn equals(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, BinaryOp::Eq, value)
    }

    pub fn not_equals(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, BinaryOp::Ne, value)
    }

    pub fn less(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, BinaryOp::Lt, value)
    }

    pub fn less_or_equal(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, BinaryOp::Le, value)
    }

    pub fn greater(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, BinaryOp::Gt, value)
    }

    pub fn greater_or_equal(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(property, BinaryOp::Ge, value)
    }

    pub fn is_null(mut self, property: impl Into<String>) -> Self {
        self.restrictions.push(Restriction::IsNull {
            property: property.into(),
            negate: false,
        });
        self
    }

    pub fn is_not_null(mut self, property: impl Into<String>) -> Self {
        self.restrictions.push(Restriction::IsNull {
            property: property.into(),
            negate: true,
        });
        self
    }

    /// SQL `LIKE` with `%` and `_` wildcards.
    pub fn like(mut self, property: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.restrictions.push(Restriction::Like {
            property: property.into(),
            pattern: pattern.into(),
        });
        self
    }

    pub fn order_by_asc(mut self, property: impl Into<String>) -> Self {
        self.order_by.push((property.into(), Direction::Asc));
        self
    }

    pub fn order_by_desc(mut self, property: impl Into<String>) -> Self {
        self.order_by.push((property.into(), Direction::Desc));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ignore_empty_criteria(mut self, ignore: bool) -> Self {
        self.ignore_empty_criteria = ignore;
        self
    }

    pub fn has_criteria(&self) -> bool {
        !self.restrictions.is_empty()
    }

    pub(crate) fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Fails unless the query restricts something or explicitly allows an
    /// unrestricted scan.
    pub(crate) fn check_criteria(&self, ty: &EntityType) -> Result<()> {
        if self.has_criteria() || self.ignore_empty_criteria {
            Ok(())
        } else {
            Err(Error::invalid_query(format!(
                "query on `{}` has no criteria; set `ignore_empty_criteria` to scan every record",
                ty.qualified_name()
            )))
        }
    }

    /// The `WHERE` expression over columns of `alias`.
    pub(crate) fn filter(&self, ty: &EntityType, alias: &str) -> Result<Option<Expr>> {
        let mut operands = Vec::with_capacity(self.restrictions.len());

        for restriction in &self.restrictions {
            let expr = match restriction {
                Restriction::Compare {
                    property,
                    op,
                    value,
                } => {
                    let (column, ty) = column_of(ty, alias, property)?;
                    Expr::binary_op(column, *op, value.clone().cast(ty)?)
                }
                Restriction::IsNull { property, negate } => {
                    let (column, _) = column_of(ty, alias, property)?;
                    if *negate {
                        Expr::is_not_null(column)
                    } else {
                        Expr::is_null(column)
                    }
                }
                Restriction::Like { property, pattern } => {
                    let (column, _) = column_of(ty, alias, property)?;
                    Expr::like(column, pattern.as_str())
                }
            };
            operands.push(expr);
        }

        Ok(match operands.len() {
            0 => None,
            1 => operands.pop(),
            _ => Some(Expr::and_from_vec(operands)),
        })
    }

    pub(crate) fn order_by(&self, ty: &EntityType, alias: &str) -> Result<Vec<OrderByExpr>> {
        self.order_by
            .iter()
            .map(|(property, direction)| {
                let (column, _) = column_of(ty, alias, property)?;
                Ok(match direction {
                    Direction::Asc => OrderByExpr::asc(column),
                    Direction::Desc => OrderByExpr::desc(column),
                })
            })
            .collect()
    }

    fn compare(
        mut self,
        property: impl Into<String>,
        op: BinaryOp,
        value: impl Into<Value>,
    ) -> Self {
        self.restrictions.push(Restriction::Compare {
            property: property.into(),
            op,
            value: value.into(),
        });
        self
    }
}

fn column_of(
    ty: &EntityType,
    alias: &str,
    property: &str,
) -> Result<(Expr, dynasty_core::stmt::Type)> {
    let index = ty.property_index_or_err(property)?;
    let target = &ty.properties()[index];

    match &target.kind {
        PropertyKind::Column { column } => Ok((Expr::qualified(alias, column), target.ty())),
        _ => Err(Error::invalid_query(format!(
            "`{property}` of `{}` is not stored in its table and cannot be queried",
            ty.qualified_name()
        ))),
    }
}
