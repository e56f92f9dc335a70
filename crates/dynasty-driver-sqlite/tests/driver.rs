use dynasty_core::{
    driver::{
        operation::{QuerySql, RawSql, Transaction},
        Capability, Operation,
    },
    schema::{
        db::{Table, TableDiff, Type},
        DataType, DescriptorBuilder, EntityDescriptor, FieldSpec, ManagementMode,
    },
    stmt::{self, Expr, Insert, Select, TableRef},
    Connection, Driver,
};
use dynasty_driver_sqlite::Sqlite;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std_util::prelude::*;

fn equipment(extra: Option<FieldSpec>) -> EntityDescriptor {
    let mut builder = DescriptorBuilder::new("com.acme.Equipment", ManagementMode::Managed);
    builder
        .table_name("EQUIPMENT")
        .unique_constraint("uq_equipment_serial", ["serialNo"]);
    builder
        .add_field(FieldSpec::new(DataType::String, "name").length(32))
        .unwrap()
        .add_field(FieldSpec::new(DataType::String, "serialNo"))
        .unwrap()
        .add_field(
            FieldSpec::new(DataType::Decimal, "price")
                .precision(18)
                .scale(2),
        )
        .unwrap()
        .add_field(FieldSpec::new(DataType::Date, "expiryDt").nullable())
        .unwrap();
    if let Some(extra) = extra {
        builder.add_field(extra).unwrap();
    }
    builder.finalize_resolution().unwrap()
}

async fn migrate(driver: &Sqlite, conn: &mut Box<dyn Connection>, desired: &Table) {
    let live = conn.describe_table(&desired.name).await.unwrap();
    let diff = TableDiff::from(live.as_ref(), desired);
    let migration = driver.generate_migration(&diff).unwrap();
    conn.apply_migration(&migration).await.unwrap();
}

#[tokio::test]
async fn created_table_describes_back() {
    let dir = tempfile::tempdir().unwrap();
    let driver = Sqlite::open(dir.path().join("catalog.db"));
    let mut conn = driver.connect().await.unwrap();

    assert_none!(conn.describe_table("EQUIPMENT").await.unwrap());

    let desired = Table::from_descriptor(&equipment(None), &Capability::SQLITE).unwrap();
    migrate(&driver, &mut conn, &desired).await;

    let live = conn.describe_table("equipment").await.unwrap().unwrap();
    assert_eq!(live.name, "EQUIPMENT");

    let columns: Vec<_> = live
        .columns
        .iter()
        .map(|column| (column.name.as_str(), column.storage_ty.clone(), column.nullable))
        .collect();
    assert_eq!(
        columns,
        [
            ("id", Type::Integer(4), false),
            ("version_no", Type::Integer(8), false),
            ("name", Type::VarChar(32), false),
            ("serial_no", Type::Text, false),
            ("price", Type::Numeric(Some((18, 2))), false),
            ("expiry_dt", Type::Date, true),
        ]
    );
    assert!(live.columns[0].primary_key);
    assert_eq!(live.indices.len(), 1);
    assert!(live.indices[0].unique);
    assert_eq!(live.indices[0].columns, ["serial_no"]);

    let diff = TableDiff::from(Some(&live), &desired);
    assert!(diff.is_unchanged());
    assert!(driver.generate_migration(&diff).unwrap().is_empty());

    assert_eq!(conn.list_tables().await.unwrap(), ["EQUIPMENT"]);
}

#[tokio::test]
async fn added_column_backfills_existing_rows() {
    let driver = Sqlite::new("sqlite::memory:").unwrap();
    let mut conn = driver.connect().await.unwrap();

    let v1 = Table::from_descriptor(&equipment(None), &Capability::SQLITE).unwrap();
    migrate(&driver, &mut conn, &v1).await;

    let insert = Insert {
        table: "EQUIPMENT".to_string(),
        columns: vec!["name".into(), "serial_no".into(), "price".into()],
        values: vec![
            Expr::value("Lathe"),
            Expr::value("SN-1"),
            Expr::value(Decimal::new(123450, 2)),
        ],
        returning: vec!["id".into()],
    };
    let response = conn
        .exec(QuerySql::new(insert, Some(vec![stmt::Type::I64])).into())
        .await
        .unwrap();
    let id = response.rows.into_values()[0][0].clone();
    assert_eq!(id, stmt::Value::I64(1));

    let v2 = Table::from_descriptor(
        &equipment(Some(FieldSpec::new(DataType::Boolean, "active"))),
        &Capability::SQLITE,
    )
    .unwrap();
    migrate(&driver, &mut conn, &v2).await;

    let mut select = Select::new(
        TableRef::new("EQUIPMENT"),
        vec![
            Expr::column("price"),
            Expr::column("expiry_dt"),
            Expr::column("active"),
        ],
    );
    select.and_filter(Expr::eq(Expr::column("id"), id));

    let rows = conn
        .exec(
            QuerySql::new(
                select,
                Some(vec![stmt::Type::Decimal, stmt::Type::Date, stmt::Type::Bool]),
            )
            .into(),
        )
        .await
        .unwrap()
        .rows
        .into_values();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0].as_decimal(), Some(Decimal::new(123450, 2)));
    assert!(rows[0][1].is_null());
    assert_eq!(rows[0][2], stmt::Value::Bool(false));
}

#[tokio::test]
async fn rolled_back_writes_are_discarded() {
    let driver = Sqlite::in_memory();
    let mut conn = driver.connect().await.unwrap();
    let mut other = driver.connect().await.unwrap();

    conn.exec(
        RawSql {
            sql: "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)".into(),
            query: false,
        }
        .into(),
    )
    .await
    .unwrap();

    conn.exec(Operation::Transaction(Transaction::Start)).await.unwrap();
    let inserted = conn
        .exec(
            RawSql {
                sql: "INSERT INTO notes (body) VALUES ('draft')".into(),
                query: false,
            }
            .into(),
        )
        .await
        .unwrap();
    assert_eq!(inserted.rows.count(), 1);
    conn.exec(Operation::Transaction(Transaction::Rollback)).await.unwrap();

    // The second connection sees the same in-memory database.
    let rows = other
        .exec(
            RawSql {
                sql: "SELECT COUNT(*), 'x' FROM notes".into(),
                query: true,
            }
            .into(),
        )
        .await
        .unwrap()
        .rows
        .into_values();
    assert_eq!(rows[0][0], stmt::Value::I64(0));
    assert_eq!(rows[0][1], stmt::Value::from("x"));

    assert_ok!(other.ping().await);
}

#[tokio::test]
async fn open_transactions_are_reported() {
    let driver = Sqlite::in_memory();
    let mut conn = driver.connect().await.unwrap();
    assert!(!conn.in_transaction());

    conn.exec(Operation::Transaction(Transaction::Start)).await.unwrap();
    assert!(conn.in_transaction());

    conn.exec(Operation::Transaction(Transaction::Commit)).await.unwrap();
    assert!(!conn.in_transaction());
}

#[test]
fn in_memory_databases_take_one_connection() {
    assert_eq!(Sqlite::in_memory().max_connections(), Some(1));

    let dir = tempfile::tempdir().unwrap();
    let file = Sqlite::open(dir.path().join("one.db"));
    assert_eq!(file.max_connections(), None);
}

#[test]
fn rejects_other_schemes() {
    let err = Sqlite::new("postgresql://localhost/db").unwrap_err();
    assert!(err.is_invalid_connection_url());

    let err = Sqlite::new("not a url").unwrap_err();
    assert!(err.is_invalid_connection_url());
}
