use park_storage::{InMemorySensorPresenceStore, SensorPresenceStore};

#[tokio::test]
async fn presence_touch_and_get() {
    let store = InMemorySensorPresenceStore::new();
    store.touch_sensor("HW-1", 1_234).await.expect("touch");
    let seen = store.get_last_seen_at_ms("HW-1").await.expect("get");
    assert_eq!(seen, Some(1_234));
    assert_eq!(store.get_last_seen_at_ms("HW-2").await.expect("get"), None);
}

#[tokio::test]
async fn presence_never_moves_backwards() {
    let store = InMemorySensorPresenceStore::new();
    store.touch_sensor("HW-1", 2_000).await.expect("touch");
    store.touch_sensor("HW-1", 1_000).await.expect("touch");
    assert_eq!(
        store.get_last_seen_at_ms("HW-1").await.expect("get"),
        Some(2_000)
    );
}

#[tokio::test]
async fn presence_list_batch() {
    let store = InMemorySensorPresenceStore::new();
    store.touch_sensor("HW-1", 1_000).await.expect("touch");
    store.touch_sensor("HW-2", 2_000).await.expect("touch");

    let seen = store
        .list_last_seen_at_ms(&["HW-1".to_string(), "HW-3".to_string()])
        .await
        .expect("list");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen.get("HW-1"), Some(&1_000));
}
