mod column;
pub use column::{Column, ColumnRef};

mod diff;
pub use diff::{ColumnMismatch, TableDiff};

mod index;
pub use index::Index;

mod migration;
pub use migration::Migration;

mod table;
pub use table::Table;

mod ty;
pub use ty::Type;
