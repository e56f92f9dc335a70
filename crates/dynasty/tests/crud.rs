mod support;

use dynasty::{
    DataSourceConfig, DataSourceManager, DataType, Db, DescriptorBuilder, EntityType,
    FieldSpec, ManagementMode, Query, Record, TypeRegistry, Value,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std_util::prelude::*;

async fn plant() -> (DataSourceManager, Db, EntityType) {
    let descriptor = support::equipment_v1();
    let registry = TypeRegistry::new();
    let equipment = registry.synthesize(&descriptor).unwrap();

    let manager = DataSourceManager::new();
    manager
        .configure(DataSourceConfig::new("plant", "sqlite::memory:").entity(descriptor))
        .await
        .unwrap();
    let db = Db::new(&manager, "plant");
    (manager, db, equipment)
}

fn machine(ty: &EntityType, name: &str, serial: &str, hours: i32) -> Record {
    let mut record = ty.new_record();
    record
        .set("name", name)
        .unwrap()
        .set("serialNo", serial)
        .unwrap()
        .set("price", Decimal::new(1000, 0))
        .unwrap()
        .set("hours", hours)
        .unwrap();
    record
}

#[tokio::test]
async fn stale_versions_are_rejected() {
    let (_manager, db, equipment) = plant().await;

    let mut lathe = machine(&equipment, "Lathe", "L-1", 10);
    let id = db.create(&mut lathe).await.unwrap();

    let mut mine = db.find(&equipment, id).await.unwrap();
    let mut theirs = db.find(&equipment, id).await.unwrap();
    assert_eq!(mine.version_no(), Some(0));

    mine.set("hours", 11).unwrap();
    db.update_by_id_version(&mut mine).await.unwrap();
    assert_eq!(mine.version_no(), Some(1));

    theirs.set("hours", 99).unwrap();
    let err = db.update_by_id_version(&mut theirs).await.unwrap_err();
    assert!(err.is_version_mismatch());
    assert!(err.is_data());
    assert_eq!(theirs.version_no(), Some(0));

    let stored = db.find(&equipment, id).await.unwrap();
    assert_eq!(stored.get("hours").unwrap(), &Value::I32(11));

    // A plain update takes whatever version is stored.
    db.update_by_id(&mut theirs).await.unwrap();
    assert_eq!(theirs.version_no(), Some(2));
    let stored = db.find(&equipment, id).await.unwrap();
    assert_eq!(stored.get("hours").unwrap(), &Value::I32(99));
    assert_eq!(stored.version_no(), Some(2));

    db.delete(&equipment, id).await.unwrap();
    assert!(db
        .update_by_id_version(&mut theirs)
        .await
        .unwrap_err()
        .is_record_not_found());
    assert!(db
        .update_by_id(&mut theirs)
        .await
        .unwrap_err()
        .is_record_not_found());
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let (_manager, db, equipment) = plant().await;

    let err = db.find(&equipment, 42).await.unwrap_err();
    assert!(err.is_record_not_found());
    assert!(db
        .delete(&equipment, 42)
        .await
        .unwrap_err()
        .is_record_not_found());

    let unsaved = machine(&equipment, "Drill", "D-1", 0);
    assert!(db.update_by_id(&mut unsaved.clone()).await.is_err());
}

#[tokio::test]
async fn failed_writes_leave_nothing_behind() {
    let (_manager, db, equipment) = plant().await;

    db.create(&mut machine(&equipment, "Lathe", "L-1", 0))
        .await
        .unwrap();

    // Same serial number violates the unique constraint.
    let mut duplicate = machine(&equipment, "Lathe", "L-1", 0);
    let err = db.create(&mut duplicate).await.unwrap_err();
    assert!(err.is_driver_operation_failed());
    assert_eq!(duplicate.id(), None);
    assert_eq!(duplicate.version_no(), None);

    assert_eq!(
        db.count_all(&equipment, &Query::new()).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn failed_creates_do_not_hand_out_identities() {
    let (author_descriptor, book_descriptor) = support::library();
    let registry = TypeRegistry::new();
    let types = registry
        .synthesize_all(&[author_descriptor.clone(), book_descriptor.clone()])
        .unwrap();
    let (author, book) = (&types[0], &types[1]);

    let manager = DataSourceManager::new();
    manager
        .configure(
            DataSourceConfig::new("library", "sqlite::memory:")
                .entities([author_descriptor, book_descriptor]),
        )
        .await
        .unwrap();
    let db = Db::new(&manager, "library");

    // The author row goes in, then the untitled book fails its NOT NULL.
    let mut tolkien = author.new_record();
    tolkien.set("name", "Tolkien").unwrap();
    tolkien.push_child("books", book.new_record()).unwrap();

    let err = db.create(&mut tolkien).await.unwrap_err();
    assert!(err.is_driver_operation_failed());
    assert_eq!(tolkien.id(), None);
    assert_eq!(tolkien.version_no(), None);
    let untitled = &tolkien.children("books").unwrap()[0];
    assert_eq!(untitled.id(), None);
    assert!(untitled.get("author").unwrap().is_null());

    let mut bob = author.new_record();
    bob.set("name", "Bob").unwrap();
    let bob_id = db.create(&mut bob).await.unwrap();

    // The rolled back record can not be written over Bob.
    tolkien.set("name", "Clobbered").unwrap();
    let err = db.update_by_id(&mut tolkien).await.unwrap_err();
    assert!(err.is_invalid_field());

    let stored = db.find(author, bob_id).await.unwrap();
    assert_eq!(stored.get("name").unwrap(), &Value::from("Bob"));
    assert_eq!(db.count_all(book, &Query::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn queries_filter_order_and_limit() {
    let (_manager, db, equipment) = plant().await;

    for (name, serial, hours) in [
        ("Drill press", "D-1", 120),
        ("Drill", "D-2", 15),
        ("Lathe", "L-1", 300),
        ("Saw", "S-1", 0),
    ] {
        db.create(&mut machine(&equipment, name, serial, hours))
            .await
            .unwrap();
    }

    let err = db
        .list_all(&equipment, &Query::new())
        .await
        .unwrap_err();
    assert!(err.is_invalid_query());

    assert_eq!(db.list_all(&equipment, &Query::all()).await.unwrap().len(), 4);
    assert_eq!(db.count_all(&equipment, &Query::new()).await.unwrap(), 4);

    let names = |records: Vec<Record>| -> Vec<Value> {
        records
            .iter()
            .map(|record| record.get("name").unwrap().clone())
            .collect()
    };

    let drills = db
        .list_all(
            &equipment,
            &Query::new().like("name", "Drill%").order_by_desc("hours"),
        )
        .await
        .unwrap();
    assert_eq!(
        names(drills),
        [Value::from("Drill press"), Value::from("Drill")]
    );

    let busy = db
        .list_all(
            &equipment,
            &Query::new()
                .greater_or_equal("hours", 15)
                .not_equals("serialNo", "L-1")
                .order_by_asc("hours"),
        )
        .await
        .unwrap();
    assert_eq!(names(busy), [Value::from("Drill"), Value::from("Drill press")]);

    let first = db
        .list_all(&equipment, &Query::all().order_by_asc("serialNo").limit(1))
        .await
        .unwrap();
    assert_eq!(names(first), [Value::from("Drill press")]);

    assert_eq!(
        db.count_all(&equipment, &Query::new().is_null("expiryDt"))
            .await
            .unwrap(),
        4
    );
    assert_eq!(
        db.count_all(&equipment, &Query::new().less("hours", 100))
            .await
            .unwrap(),
        2
    );

    assert!(db
        .list_all(&equipment, &Query::new().equals("colour", "red"))
        .await
        .unwrap_err()
        .is_unknown_property());
}

#[tokio::test]
async fn delete_all_needs_criteria() {
    let (_manager, db, equipment) = plant().await;
    for serial in ["A-1", "A-2", "B-1"] {
        db.create(&mut machine(&equipment, "Pump", serial, 0))
            .await
            .unwrap();
    }

    assert!(db
        .delete_all(&equipment, &Query::new())
        .await
        .unwrap_err()
        .is_invalid_query());
    assert_eq!(db.count_all(&equipment, &Query::new()).await.unwrap(), 3);

    let deleted = db
        .delete_all(&equipment, &Query::new().like("serialNo", "A-%"))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let deleted = db.delete_all(&equipment, &Query::all()).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(db.count_all(&equipment, &Query::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn deleting_a_parent_deletes_its_children() {
    let (author_descriptor, book_descriptor) = support::library();
    let registry = TypeRegistry::new();
    let types = registry
        .synthesize_all(&[author_descriptor.clone(), book_descriptor.clone()])
        .unwrap();
    let (author, book) = (&types[0], &types[1]);

    let manager = DataSourceManager::new();
    manager
        .configure(
            DataSourceConfig::new("library", "sqlite::memory:")
                .entities([author_descriptor, book_descriptor]),
        )
        .await
        .unwrap();
    let db = Db::new(&manager, "library");

    let mut ids = vec![];
    for (name, titles) in [("Le Guin", 3), ("Herbert", 2)] {
        let mut writer = author.new_record();
        writer.set("name", name).unwrap();
        for n in 0..titles {
            let mut volume = book.new_record();
            volume.set("title", format!("{name} #{n}")).unwrap();
            writer.push_child("books", volume).unwrap();
        }
        ids.push(db.create(&mut writer).await.unwrap());
    }
    assert_eq!(db.count_all(book, &Query::new()).await.unwrap(), 5);

    // List-only values can not be queried.
    assert!(db
        .list_all(book, &Query::new().equals("authorName", "Herbert"))
        .await
        .unwrap_err()
        .is_invalid_query());

    db.delete(author, ids[0]).await.unwrap();
    assert_eq!(db.count_all(book, &Query::new()).await.unwrap(), 2);
    assert!(db.find(author, ids[0]).await.unwrap_err().is_record_not_found());

    let remaining = db
        .list_all(book, &Query::new().equals("author", ids[1]))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 2);

    assert_eq!(
        db.delete_all(author, &Query::new().equals("name", "Herbert"))
            .await
            .unwrap(),
        1
    );
    assert_eq!(db.count_all(book, &Query::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn adhoc_tables_are_used_as_found() {
    let dir = tempfile::tempdir().unwrap();
    let url = support::sqlite_url(dir.path(), "legacy.db");

    let manager = DataSourceManager::new();
    manager
        .test_native_update(
            &DataSourceConfig::new("legacy", &url),
            "CREATE TABLE legacy_items (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT)",
        )
        .await
        .unwrap();

    let mut builder = DescriptorBuilder::new("com.acme.LegacyItem", ManagementMode::Adhoc);
    builder.table_name("legacy_items");
    builder
        .add_field(FieldSpec::new(DataType::String, "label").nullable())
        .unwrap();
    let descriptor = builder.finalize_resolution().unwrap();
    let item = TypeRegistry::new().synthesize(&descriptor).unwrap();

    manager
        .configure(DataSourceConfig::new("legacy", &url).entity(descriptor.clone()))
        .await
        .unwrap();
    let reports = manager
        .create_or_update_data_source_dynamic_entity_schema_objects("legacy", &[descriptor])
        .await
        .unwrap();
    assert!(reports[0].is_unchanged());

    let db = Db::new(&manager, "legacy");
    let mut record = item.new_record();
    record.set("label", "first").unwrap();
    let id = db.create(&mut record).await.unwrap();
    assert_none!(record.version_no());

    record.set("label", "second").unwrap();
    assert!(db
        .update_by_id_version(&mut record)
        .await
        .unwrap_err()
        .is_unsupported_feature());
    db.update_by_id(&mut record).await.unwrap();

    let stored = db.find(&item, id).await.unwrap();
    assert_eq!(stored.get("label").unwrap(), &Value::from("second"));
}
