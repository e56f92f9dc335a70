use super::{Column, Index, Table, Type};

/// The difference between a live table and the table a descriptor wants.
///
/// Only additions are ever planned. Live columns and indices missing from
/// the descriptor are left alone; columns present on both sides with a
/// different storage type or nullability are reported as mismatches and
/// never altered.
#[derive(Debug)]
pub enum TableDiff<'a> {
    /// The table does not exist yet.
    CreateTable(&'a Table),

    AlterTable {
        table: &'a Table,
        add_columns: Vec<&'a Column>,
        add_indices: Vec<&'a Index>,
        mismatches: Vec<ColumnMismatch>,
    },

    Unchanged { mismatches: Vec<ColumnMismatch> },
}

/// A column whose live definition differs from the declared one.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMismatch {
    pub column: String,
    pub live_ty: Type,
    pub declared_ty: Type,
    pub live_nullable: bool,
    pub declared_nullable: bool,
}

impl<'a> TableDiff<'a> {
    pub fn from(live: Option<&Table>, desired: &'a Table) -> Self {
        let Some(live) = live else {
            return TableDiff::CreateTable(desired);
        };

        let mut add_columns = vec![];
        let mut mismatches = vec![];

        for column in &desired.columns {
            match live.column(&column.name) {
                None => add_columns.push(column),
                Some(_) if column.primary_key => {}
                Some(existing) => {
                    if existing.storage_ty != column.storage_ty
                        || existing.nullable != column.nullable
                    {
                        mismatches.push(ColumnMismatch {
                            column: column.name.clone(),
                            live_ty: existing.storage_ty.clone(),
                            declared_ty: column.storage_ty.clone(),
                            live_nullable: existing.nullable,
                            declared_nullable: column.nullable,
                        });
                    }
                }
            }
        }

        let add_indices: Vec<_> = desired
            .indices
            .iter()
            .filter(|index| live.index(&index.name).is_none())
            .collect();

        if add_columns.is_empty() && add_indices.is_empty() {
            TableDiff::Unchanged { mismatches }
        } else {
            TableDiff::AlterTable {
                table: desired,
                add_columns,
                add_indices,
                mismatches,
            }
        }
    }

    pub fn mismatches(&self) -> &[ColumnMismatch] {
        match self {
            TableDiff::CreateTable(_) => &[],
            TableDiff::AlterTable { mismatches, .. } | TableDiff::Unchanged { mismatches } => {
                mismatches
            }
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, TableDiff::Unchanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        driver::Capability,
        schema::{DataType, DescriptorBuilder, FieldSpec, ManagementMode},
    };
    use pretty_assertions::assert_eq;

    fn table(fields: Vec<FieldSpec>) -> Table {
        let mut builder = DescriptorBuilder::new("com.acme.Equipment", ManagementMode::Managed);
        builder.table_name("EQUIPMENT");
        builder.unique_constraint("uq_equipment_serial", ["serialNo"]);
        for field in fields {
            builder.add_field(field).unwrap();
        }
        let descriptor = builder.finalize_resolution().unwrap();
        Table::from_descriptor(&descriptor, &Capability::SQLITE).unwrap()
    }

    fn v1() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(DataType::String, "name").length(32),
            FieldSpec::new(DataType::String, "serialNo").length(16),
        ]
    }

    #[test]
    fn missing_table_is_created() {
        let desired = table(v1());
        assert!(matches!(TableDiff::from(None, &desired), TableDiff::CreateTable(_)));
    }

    #[test]
    fn identical_table_is_unchanged() {
        let desired = table(v1());
        let live = desired.clone();
        let diff = TableDiff::from(Some(&live), &desired);
        assert!(diff.is_unchanged());
        assert!(diff.mismatches().is_empty());
    }

    #[test]
    fn new_columns_are_added_and_extra_live_columns_kept() {
        let mut live = table(v1());
        live.columns.push(Column {
            name: "LEGACY_CD".to_string(),
            ty: crate::stmt::Type::String,
            storage_ty: Type::Text,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            default: None,
            references: None,
        });

        let mut fields = v1();
        fields.push(FieldSpec::new(DataType::String, "refNo").nullable());
        fields.push(FieldSpec::new(DataType::Boolean, "active").default_value(false));
        let desired = table(fields);

        let TableDiff::AlterTable {
            add_columns,
            add_indices,
            mismatches,
            ..
        } = TableDiff::from(Some(&live), &desired)
        else {
            panic!("expected alter");
        };

        let added: Vec<_> = add_columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(added, ["ref_no", "active"]);
        assert!(add_indices.is_empty());
        assert!(mismatches.is_empty());
    }

    #[test]
    fn length_change_is_reported_not_altered() {
        let live = table(v1());
        let desired = table(vec![
            FieldSpec::new(DataType::String, "name").length(64),
            FieldSpec::new(DataType::String, "serialNo").length(16),
        ]);

        let diff = TableDiff::from(Some(&live), &desired);
        assert!(diff.is_unchanged());
        assert_eq!(
            diff.mismatches(),
            [ColumnMismatch {
                column: "name".to_string(),
                live_ty: Type::VarChar(32),
                declared_ty: Type::VarChar(64),
                live_nullable: false,
                declared_nullable: false,
            }]
        );
    }

    #[test]
    fn column_names_compare_case_insensitively() {
        let mut live = table(v1());
        for column in &mut live.columns {
            column.name = column.name.to_uppercase();
        }
        let desired = table(v1());
        assert!(TableDiff::from(Some(&live), &desired).is_unchanged());
    }

    #[test]
    fn missing_index_is_added() {
        let mut live = table(v1());
        live.indices.clear();
        let desired = table(v1());

        let TableDiff::AlterTable {
            add_columns,
            add_indices,
            ..
        } = TableDiff::from(Some(&live), &desired)
        else {
            panic!("expected alter");
        };
        assert!(add_columns.is_empty());
        assert_eq!(add_indices[0].name, "uq_equipment_serial");
    }

    #[test]
    fn not_null_date_without_default_cannot_backfill() {
        let desired = table(vec![
            FieldSpec::new(DataType::String, "serialNo"),
            FieldSpec::new(DataType::Date, "createDt"),
            FieldSpec::new(DataType::Boolean, "active"),
        ]);

        let create_dt = desired.column("create_dt").unwrap();
        assert!(create_dt
            .backfill_default("EQUIPMENT")
            .unwrap_err()
            .is_schema_migration());

        let active = desired.column("active").unwrap();
        assert_eq!(
            active.backfill_default("EQUIPMENT").unwrap(),
            Some(crate::stmt::Value::Bool(false))
        );
    }
}
