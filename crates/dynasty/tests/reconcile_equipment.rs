mod support;

use dynasty::{
    DataSourceConfig, DataSourceManager, Db, Query, ReconcileOutcome, TypeRegistry, Value,
};
use pretty_assertions::assert_eq;
use chrono::NaiveDate;
use rust_decimal::Decimal;

#[tokio::test]
async fn new_fields_are_added_to_a_live_table() {
    support::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let url = support::sqlite_url(dir.path(), "plant.db");

    let v1 = support::equipment_v1();
    let registry = TypeRegistry::new();
    let equipment_v1 = registry.synthesize(&v1).unwrap();

    let manager = DataSourceManager::new();
    manager
        .configure(DataSourceConfig::new("plant", &url).entity(v1))
        .await
        .unwrap();
    let db = Db::new(&manager, "plant");

    let mut lathe = equipment_v1.new_record();
    lathe
        .set("name", "Lathe")
        .unwrap()
        .set("serialNo", "L-100")
        .unwrap()
        .set("price", Decimal::new(123450, 2))
        .unwrap();
    let id = db.create(&mut lathe).await.unwrap();

    let v2 = support::equipment_v2();
    let reports = manager
        .create_or_update_data_source_dynamic_entity_schema_objects("plant", &[v2.clone()])
        .await
        .unwrap();
    assert_eq!(
        reports[0].outcome,
        ReconcileOutcome::Altered {
            added_columns: vec!["ref_no".to_string(), "active".to_string()],
            added_indices: vec![],
        }
    );
    assert!(reports[0].mismatches.is_empty());

    let columns: Vec<_> = manager
        .columns("plant", "EQUIPMENT")
        .await
        .unwrap()
        .into_iter()
        .map(|column| column.name.to_lowercase())
        .collect();
    assert!(columns.contains(&"ref_no".to_string()));
    assert!(columns.contains(&"active".to_string()));

    let equipment_v2 = registry.synthesize(&v2).unwrap();
    assert!(!equipment_v2.ptr_eq(&equipment_v1));
    assert_eq!(registry.get("com.acme.Equipment").unwrap(), equipment_v2);
    assert_eq!(registry.history("com.acme.Equipment"), [equipment_v1]);

    // Rows written before the change read back with the backfilled values.
    let lathe = db.find(&equipment_v2, id).await.unwrap();
    assert_eq!(lathe.get("name").unwrap(), &Value::from("Lathe"));
    assert!(lathe.get("refNo").unwrap().is_null());
    assert_eq!(lathe.get("active").unwrap(), &Value::Bool(false));
    assert_eq!(
        lathe.get("price").unwrap().as_decimal().unwrap().to_string(),
        "1234.50"
    );
    assert!(lathe.get("expiryDt").unwrap().is_null());

    let mut press = equipment_v2.new_record();
    press
        .set("name", "Press")
        .unwrap()
        .set("serialNo", "P-200")
        .unwrap()
        .set("price", Decimal::new(99, 0))
        .unwrap()
        .set("refNo", "R-1")
        .unwrap()
        .set("active", true)
        .unwrap()
        .set("expiryDt", NaiveDate::from_ymd_opt(2030, 1, 31).unwrap())
        .unwrap();
    let press_id = db.create(&mut press).await.unwrap();

    let press = db.find(&equipment_v2, press_id).await.unwrap();
    assert_eq!(
        press.get("expiryDt").unwrap(),
        &Value::Date(NaiveDate::from_ymd_opt(2030, 1, 31).unwrap())
    );
    assert_eq!(press.get("refNo").unwrap(), &Value::from("R-1"));

    assert_eq!(
        db.count_all(&equipment_v2, &Query::new().equals("active", true))
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn reconciling_twice_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let url = support::sqlite_url(dir.path(), "plant.db");

    let manager = DataSourceManager::new();
    manager
        .configure(DataSourceConfig::new("plant", &url).entity(support::equipment_v1()))
        .await
        .unwrap();

    let v2 = support::equipment_v2();
    let first = manager
        .create_or_update_data_source_dynamic_entity_schema_objects("plant", &[v2.clone()])
        .await
        .unwrap();
    assert!(!first[0].is_unchanged());

    let second = manager
        .create_or_update_data_source_dynamic_entity_schema_objects("plant", &[v2])
        .await
        .unwrap();
    assert_eq!(second[0].outcome, ReconcileOutcome::Unchanged);

    // Reconfiguring against the same file sees the table as it is.
    manager.terminate_configuration("plant").await.unwrap();
    manager
        .configure(DataSourceConfig::new("plant", &url).entity(support::equipment_v1()))
        .await
        .unwrap();
    let tables = manager.tables("plant").await.unwrap();
    assert!(tables.iter().any(|table| table.eq_ignore_ascii_case("EQUIPMENT")));
}

#[tokio::test]
async fn descriptor_and_table_are_created_together() {
    let manager = DataSourceManager::new();
    manager
        .configure(DataSourceConfig::new("plant", "sqlite::memory:"))
        .await
        .unwrap();
    assert!(manager.tables("plant").await.unwrap().is_empty());

    let (author, book) = support::library();
    let reports = manager
        .create_or_update_data_source_dynamic_entity_schema_objects("plant", &[book, author])
        .await
        .unwrap();

    // Reports follow the input order even though authors are created first.
    let outcomes: Vec<_> = reports
        .iter()
        .map(|report| (report.table.as_str(), report.outcome.clone()))
        .collect();
    assert_eq!(
        outcomes,
        [
            ("books", ReconcileOutcome::Created),
            ("authors", ReconcileOutcome::Created)
        ]
    );

    let configured = manager.configuration("plant").await.unwrap();
    assert_eq!(configured.entity_descriptors().len(), 2);
}
