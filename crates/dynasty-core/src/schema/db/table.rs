use super::{Column, ColumnRef, Index, Type};
use crate::{
    driver::Capability,
    schema::{EntityDescriptor, ID_COLUMN},
    Result,
};

/// A database table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the table
    pub name: String,

    /// The table's columns
    pub columns: Vec<Column>,

    pub indices: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![],
            indices: vec![],
        }
    }

    /// The table a finalized descriptor wants: one column per column field,
    /// the identity column as an auto-incremented primary key, and one index
    /// per declared uniqueness group or index.
    pub fn from_descriptor(
        descriptor: &EntityDescriptor,
        capability: &Capability,
    ) -> Result<Table> {
        let resolved = descriptor.resolved()?;
        let mut table = Table::new(resolved.table_name());

        for field in resolved.columns() {
            let references = if field.is_foreign_key() {
                let target = descriptor.reference_target(field)?;
                Some(ColumnRef {
                    table: target.table_name()?.to_string(),
                    column: ID_COLUMN.to_string(),
                })
            } else {
                None
            };

            let identity = field.is_identity();

            table.columns.push(Column {
                name: field.column_name.clone(),
                ty: field.data_type.ty(),
                storage_ty: Type::from_field(field, &capability.storage_types)?,
                nullable: field.nullable && !identity,
                primary_key: identity,
                auto_increment: identity,
                default: field.default_value.clone(),
                references,
            });
        }

        for spec in descriptor.indices()? {
            let mut columns = vec![];
            for property in &spec.properties {
                if let Some(field) = resolved.field(property) {
                    columns.push(field.column_name.clone());
                }
            }

            table.indices.push(Index {
                name: spec.name.clone(),
                columns,
                unique: spec.unique,
            });
        }

        Ok(table)
    }

    /// Looks up a column by name, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indices
            .iter()
            .find(|index| index.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|column| column.primary_key)
    }
}
