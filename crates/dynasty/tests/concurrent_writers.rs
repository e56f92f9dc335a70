mod support;

use dynasty::{DataSourceConfig, DataSourceManager, Db, EntityType, Query, Record, TypeRegistry};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

const TASKS: usize = 8;

async fn plant(url: String) -> (DataSourceManager, Db, EntityType) {
    support::init_tracing();

    let descriptor = support::equipment_v1();
    let equipment = TypeRegistry::new().synthesize(&descriptor).unwrap();

    let manager = DataSourceManager::new();
    manager
        .configure(
            DataSourceConfig::new("plant", url)
                .pool_size(4)
                .entity(descriptor),
        )
        .await
        .unwrap();
    let db = Db::new(&manager, "plant");
    (manager, db, equipment)
}

fn machine(ty: &EntityType, serial: String) -> Record {
    let mut record = ty.new_record();
    record
        .set("name", "Press")
        .unwrap()
        .set("serialNo", serial)
        .unwrap()
        .set("price", Decimal::new(250, 0))
        .unwrap();
    record
}

async fn create_and_read_back(db: Db, equipment: EntityType, per_task: usize) {
    let mut tasks = vec![];
    for task in 0..TASKS {
        let db = db.clone();
        let equipment = equipment.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..per_task {
                let mut record = machine(&equipment, format!("{task}-{n}"));
                let id = db.create(&mut record).await.unwrap();
                let found = db.find(&equipment, id).await.unwrap();
                assert_eq!(found.id(), Some(id));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let total = db.count_all(&equipment, &Query::new()).await.unwrap();
    assert_eq!(total, (TASKS * per_task) as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_memory_writers_share_one_connection() {
    let (manager, db, equipment) = plant("sqlite::memory:".to_string()).await;
    create_and_read_back(db, equipment, 50).await;
    manager.terminate_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_writers_do_not_lock_each_other_out() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, db, equipment) = plant(support::sqlite_url(dir.path(), "plant.db")).await;
    create_and_read_back(db, equipment, 30).await;
    manager.terminate_all().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_each_bump_the_version() {
    const UPDATES: usize = 30;

    let dir = tempfile::tempdir().unwrap();
    let (manager, db, equipment) = plant(support::sqlite_url(dir.path(), "plant.db")).await;
    let id = db
        .create(&mut machine(&equipment, "shared".to_string()))
        .await
        .unwrap();

    let mut tasks = vec![];
    for task in 0..TASKS {
        let db = db.clone();
        let equipment = equipment.clone();
        tasks.push(tokio::spawn(async move {
            for n in 0..UPDATES {
                let mut record = db.find(&equipment, id).await.unwrap();
                record.set("hours", (task * UPDATES + n) as i32).unwrap();
                db.update_by_id(&mut record).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let stored = db.find(&equipment, id).await.unwrap();
    assert_eq!(stored.version_no(), Some((TASKS * UPDATES) as i64));
    manager.terminate_all().await;
}
