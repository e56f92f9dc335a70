use dynasty_core::{
    schema::db::{self, Column, ColumnRef},
    stmt::Value,
};

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub ty: db::Type,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<Value>,
    pub references: Option<ColumnRef>,
}

impl ColumnDef {
    pub(crate) fn from_schema(column: &Column) -> ColumnDef {
        ColumnDef {
            name: column.name.clone(),
            ty: column.storage_ty.clone(),
            nullable: column.nullable,
            primary_key: column.primary_key,
            auto_increment: column.auto_increment,
            default: column.default.clone(),
            references: column.references.clone(),
        }
    }
}
