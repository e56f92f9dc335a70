mod delete;
pub use delete::Delete;

mod direction;
pub use direction::Direction;

mod expr;
pub use expr::Expr;

mod expr_binary_op;
pub use expr_binary_op::ExprBinaryOp;

mod expr_column;
pub use expr_column::ExprColumn;

mod expr_is_null;
pub use expr_is_null::ExprIsNull;

mod expr_like;
pub use expr_like::ExprLike;

mod insert;
pub use insert::Insert;

mod op_binary;
pub use op_binary::BinaryOp;

mod order_by_expr;
pub use order_by_expr::OrderByExpr;

mod select;
pub use select::{Join, Select};

mod statement;
pub use statement::Statement;

mod table_ref;
pub use table_ref::TableRef;

mod ty;
pub use ty::Type;

mod update;
pub use update::{Assignment, Update};

mod value;
pub use value::Value;

mod value_record;
pub use value_record::ValueRecord;
