use dynasty_core::{
    driver::Capability,
    schema::{
        db::{Table, TableDiff},
        DataType, DescriptorBuilder, FieldSpec, ManagementMode,
    },
    stmt::Value,
};
use dynasty_sql::{MigrationStatement, Serializer};
use pretty_assertions::assert_eq;

fn equipment(extra: Vec<FieldSpec>) -> Table {
    let mut builder = DescriptorBuilder::new("com.acme.Equipment", ManagementMode::Managed);
    builder.table_name("EQUIPMENT");
    builder
        .add_field(FieldSpec::new(DataType::String, "name").length(32))
        .unwrap();
    for field in extra {
        builder.add_field(field).unwrap();
    }
    let descriptor = builder.finalize_resolution().unwrap();
    Table::from_descriptor(&descriptor, &Capability::SQLITE).unwrap()
}

fn migrate(serializer: Serializer, live: &Table, desired: &Table) -> Vec<String> {
    let diff = TableDiff::from(Some(live), desired);
    MigrationStatement::from_diff(&diff)
        .unwrap()
        .iter()
        .map(|ms| serializer.serialize(ms.statement(), &mut Vec::<Value>::new()))
        .collect()
}

#[test]
fn add_columns_with_backfill_defaults() {
    let live = equipment(vec![]);
    let desired = equipment(vec![
        FieldSpec::new(DataType::String, "refNo").length(20).nullable(),
        FieldSpec::new(DataType::Boolean, "active"),
        FieldSpec::new(DataType::Long, "hours").default_value(7i64),
    ]);

    assert_eq!(
        migrate(Serializer::sqlite(), &live, &desired),
        [
            "ALTER TABLE \"EQUIPMENT\" ADD COLUMN \"ref_no\" VARCHAR(20);",
            "ALTER TABLE \"EQUIPMENT\" ADD COLUMN \"active\" BOOLEAN NOT NULL DEFAULT 0;",
            "ALTER TABLE \"EQUIPMENT\" ADD COLUMN \"hours\" BIGINT NOT NULL DEFAULT 7;",
        ]
    );

    assert_eq!(
        migrate(Serializer::postgresql(), &live, &desired)[1],
        "ALTER TABLE \"EQUIPMENT\" ADD COLUMN \"active\" BOOLEAN NOT NULL DEFAULT FALSE;"
    );
}

#[test]
fn string_default_is_quoted() {
    let live = equipment(vec![]);
    let desired = equipment(vec![
        FieldSpec::new(DataType::String, "status").default_value("it's new")
    ]);

    assert_eq!(
        migrate(Serializer::sqlite(), &live, &desired),
        ["ALTER TABLE \"EQUIPMENT\" ADD COLUMN \"status\" TEXT NOT NULL DEFAULT 'it''s new';"]
    );
}

#[test]
fn unchanged_table_plans_nothing() {
    let live = equipment(vec![]);
    let desired = equipment(vec![]);
    assert!(migrate(Serializer::sqlite(), &live, &desired).is_empty());
}

#[test]
fn not_null_timestamp_without_default_is_rejected() {
    let live = equipment(vec![]);
    let desired = equipment(vec![FieldSpec::new(DataType::Timestamp, "createDt")]);

    let diff = TableDiff::from(Some(&live), &desired);
    let err = MigrationStatement::from_diff(&diff).unwrap_err();
    assert!(err.is_schema_migration());
}
