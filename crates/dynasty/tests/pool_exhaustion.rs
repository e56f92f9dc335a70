mod support;

use dynasty::{DataSourceConfig, DataSourceManager};
use std::time::{Duration, Instant};

#[tokio::test]
async fn checkout_times_out_when_every_connection_is_out() {
    support::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let manager = DataSourceManager::new();
    manager
        .configure(
            DataSourceConfig::new("busy", support::sqlite_url(dir.path(), "busy.db"))
                .pool_size(2)
                .checkout_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap();

    let first = manager.get_connection("busy").await.unwrap();
    let second = manager.get_connection("busy").await.unwrap();

    let started = Instant::now();
    let err = manager.get_connection("busy").await.unwrap_err();
    assert!(err.is_pool_exhausted());
    assert!(err.is_configuration());
    assert!(started.elapsed() >= Duration::from_millis(150));

    manager.restore_connection("busy", first).unwrap();
    let third = manager.get_connection("busy").await.unwrap();

    manager.restore_connection("busy", second).unwrap();
    manager.restore_connection("busy", third).unwrap();
}

#[tokio::test]
async fn waiting_checkout_gets_a_restored_connection() {
    let manager = DataSourceManager::new();
    manager
        .configure(
            DataSourceConfig::new("busy", "sqlite::memory:")
                .pool_size(1)
                .checkout_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    let held = manager.get_connection("busy").await.unwrap();

    let waiter = tokio::spawn({
        let manager = manager.clone();
        async move {
            let connection = manager.get_connection("busy").await?;
            manager.restore_connection("busy", connection)
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.restore_connection("busy", held).unwrap();

    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn names_do_not_wait_on_each_other() {
    let manager = DataSourceManager::new();
    for name in ["left", "right"] {
        manager
            .configure(
                DataSourceConfig::new(name, "sqlite::memory:")
                    .pool_size(1)
                    .checkout_timeout(Duration::from_millis(100)),
            )
            .await
            .unwrap();
    }

    let left = manager.get_connection("left").await.unwrap();
    assert!(manager
        .get_connection("left")
        .await
        .unwrap_err()
        .is_pool_exhausted());

    let right = manager.get_connection("right").await.unwrap();
    manager.restore_connection("right", right).unwrap();
    manager.restore_connection("left", left).unwrap();
}
