//! Persistence tests
//!
//! These tests verify that:
//! - Every command writes the full state through to the store
//! - A failing store does not undo the in-memory change
//! - Boot fails when the store cannot be read
//! - Stored endpoints come back in order, invalid ones are skipped

use std::sync::Arc;

use assert_matches::assert_matches;
use guardia_status::ChannelId;
use guardia_status::monitor::{CoreError, MonitorCore, MonitorParts};
use guardia_status::storage::{StoredEndpoint, StoredState};
use pretty_assertions::assert_eq;

use crate::helpers::{
    FailingStore, RecordingDisplay, RecordingNotifier, ScriptedProbe, UnreadableStore, harness,
    harness_with, test_settings,
};

fn stored(address: &str, name: &str) -> StoredEndpoint {
    StoredEndpoint {
        address: address.to_string(),
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_commands_write_through() {
    let h = harness().await;

    h.core.add_endpoint("b.example.com", "B").await.unwrap();
    h.core.add_endpoint("a.example.com:25570", "A").await.unwrap();
    h.core.set_alert_destination(ChannelId(5), "{server} down").await;
    h.core.toggle_show_address().await;
    h.core.set_display_destination(ChannelId(6)).await.unwrap();

    let state = h.store.stored().await.unwrap();
    assert_eq!(
        state.endpoints,
        vec![stored("b.example.com", "B"), stored("a.example.com:25570", "A")]
    );
    assert_eq!(state.config.alert_channel, Some(ChannelId(5)));
    assert_eq!(state.config.alert_template, "{server} down");
    assert!(state.config.show_address);
    assert_eq!(state.config.display_channel, Some(ChannelId(6)));
    assert!(state.config.display_message.is_some());

    h.core.remove_endpoint("b.example.com").await.unwrap();
    let state = h.store.stored().await.unwrap();
    assert_eq!(state.endpoints, vec![stored("a.example.com:25570", "A")]);
}

#[tokio::test]
async fn test_failed_write_keeps_change_in_memory() {
    let core = MonitorCore::bootstrap(
        test_settings(),
        MonitorParts {
            store: Arc::new(FailingStore::default()),
            probe: ScriptedProbe::new(),
            display: RecordingDisplay::new(),
            notifier: RecordingNotifier::new(),
        },
    )
    .await
    .unwrap();

    let ack = core.add_endpoint("mc.example.com", "Survival").await.unwrap();
    assert!(!ack.persisted());
    assert!(core.get_endpoint("mc.example.com").await.is_some());

    let ack = core.toggle_show_address().await;
    assert!(ack.value);
    assert!(ack.persistence_error.is_some());
}

#[tokio::test]
async fn test_unreadable_store_is_fatal() {
    let result = MonitorCore::bootstrap(
        test_settings(),
        MonitorParts {
            store: Arc::new(UnreadableStore),
            probe: ScriptedProbe::new(),
            display: RecordingDisplay::new(),
            notifier: RecordingNotifier::new(),
        },
    )
    .await;

    let Err(err) = result else {
        panic!("boot succeeded with an unreadable store");
    };
    assert_matches!(err, CoreError::Storage(_));
}

#[tokio::test]
async fn test_boot_restores_endpoints_in_order() {
    let mut initial = StoredState::default();
    initial.endpoints = vec![
        stored("z.example.com", "Zeta"),
        stored("bad:port", "Broken"),
        stored("a.example.com", "Alpha"),
    ];
    initial.config.show_address = true;

    let h = harness_with(test_settings(), initial).await;

    let snapshot = h.core.status_snapshot().await;
    let names: Vec<_> = snapshot.snapshot.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Zeta", "Alpha"]);
    assert!(snapshot.config.show_address);
}

#[tokio::test]
async fn test_configured_template_applies_until_alert_is_set() {
    let mut settings = test_settings();
    settings.alert_template = "{server} went away".to_string();

    let h = harness_with(settings, StoredState::default()).await;
    assert_eq!(
        h.core.configuration().await.alert_template,
        "{server} went away"
    );

    h.core.set_alert_destination(ChannelId(1), "").await;
    assert_eq!(
        h.core.configuration().await.alert_template,
        "{server} went away"
    );
}

#[cfg(feature = "storage-sqlite")]
#[tokio::test]
async fn test_sqlite_state_survives_restart() {
    use guardia_status::storage::sqlite::SqliteStore;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let path = dir.path().join("status.db");

    let parts = |store: Arc<SqliteStore>| MonitorParts {
        store,
        probe: ScriptedProbe::new(),
        display: RecordingDisplay::new(),
        notifier: RecordingNotifier::new(),
    };

    {
        let store = Arc::new(SqliteStore::new(&path).await.unwrap());
        let core = MonitorCore::bootstrap(test_settings(), parts(store)).await.unwrap();
        core.add_endpoint("mc.example.com", "Survival").await.unwrap();
        core.add_endpoint("creative.example.com", "Creative").await.unwrap();
        core.set_alert_destination(ChannelId(77), "{server}!").await;
    }

    let store = Arc::new(SqliteStore::new(&path).await.unwrap());
    let core = MonitorCore::bootstrap(test_settings(), parts(store)).await.unwrap();

    let view = core.status_snapshot().await;
    let addresses: Vec<_> = view.snapshot.iter().map(|e| e.address.as_str()).collect();
    assert_eq!(addresses, vec!["mc.example.com", "creative.example.com"]);
    assert_eq!(view.config.alert_channel, Some(ChannelId(77)));
    assert_eq!(view.config.alert_template, "{server}!");
}
