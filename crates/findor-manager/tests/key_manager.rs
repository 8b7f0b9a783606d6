//! Behaviour tests for the key manager against a scripted key service.

use std::sync::Arc;
use std::time::Duration;

use findor_core::api_key::{ApiKeyListItem, CreatedApiKey, StatusResponse};
use findor_core::Session;
use findor_manager::{KeyManager, Phase, CREATE_FAILED, DELETE_FAILED, FETCH_FAILED};
use findor_testkit::{Op, ScriptedKeyService};

const EMAIL: &str = "a@x.com";

fn item(key: &str, created_at: &str) -> ApiKeyListItem {
    ApiKeyListItem {
        key: key.into(),
        created_at: created_at.into(),
    }
}

fn scenario_list() -> Vec<ApiKeyListItem> {
    vec![item("sk_abc123...wxyz", "2024-01-01T00:00:00Z")]
}

fn created(secret: &str) -> CreatedApiKey {
    CreatedApiKey {
        secret: secret.into(),
        created_at: 1_700_000_000,
        status: "active".into(),
        message: "API key created".into(),
        status_code: 200,
    }
}

fn setup(list: Vec<ApiKeyListItem>) -> (KeyManager, Arc<ScriptedKeyService>) {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(list));
    let manager = KeyManager::new(service.clone());
    (manager, service)
}

/// Yield to spawned tasks until `cond` holds.
async fn until(cond: impl Fn() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

// ---- Initialize ----

#[tokio::test]
async fn initialize_loads_keys_in_backend_order() {
    let (manager, service) = setup(vec![
        item("sk_first0001", "2024-01-01T00:00:00Z"),
        item("qsk-second00002", "2024-02-01T00:00:00Z"),
        item("sk_third0003", "2024-03-01T00:00:00Z"),
    ]);

    manager.initialize(EMAIL).await;

    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.email.as_deref(), Some(EMAIL));
    assert_eq!(state.key_count(), 3);
    let secrets: Vec<&str> = state.keys.iter().map(|k| k.secret.as_str()).collect();
    assert_eq!(secrets, vec!["sk_first0001", "qsk-second00002", "sk_third0003"]);
    assert_eq!(state.keys[1].masked(), "qsk-seco...0002");
    assert_eq!(service.calls(Op::CreateUser), 1);
    assert_eq!(service.calls(Op::List), 1);
}

#[tokio::test]
async fn scenario_single_key_is_masked_and_dated() {
    let (manager, _service) = setup(scenario_list());
    manager.initialize(EMAIL).await;

    let state = manager.snapshot();
    assert_eq!(state.keys.len(), 1);
    assert_eq!(state.keys[0].name, "API Key 1");
    assert!(state.keys[0].masked().ends_with("wxyz"));
    assert_eq!(state.keys[0].created_on(), "Jan 1, 2024");
}

#[tokio::test]
async fn create_user_failure_is_ignored() {
    let (manager, service) = setup(scenario_list());
    service.push_create_user(Err(500));

    manager.initialize(EMAIL).await;

    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn foreground_list_failure_moves_to_error() {
    let (manager, service) = setup(scenario_list());
    service.push_list(Err(502));

    manager.initialize(EMAIL).await;

    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.error.as_deref(), Some(FETCH_FAILED));
    assert!(state.keys.is_empty());
}

#[tokio::test]
async fn foreground_refresh_failure_keeps_stale_list() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    service.push_list(Err(500));

    manager.refresh().await;

    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.error.as_deref(), Some(FETCH_FAILED));
    assert_eq!(state.keys.len(), 1);

    manager.refresh().await;
    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn initialize_twice_does_not_duplicate_list_calls() {
    let (manager, service) = setup(scenario_list());
    service.hold(Op::List);

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.initialize(EMAIL).await }
    });
    until(|| service.calls(Op::List) == 1).await;
    assert!(manager.snapshot().is_loading());

    manager.initialize(EMAIL).await;
    assert_eq!(service.calls(Op::List), 1);
    assert_eq!(service.calls(Op::CreateUser), 1);

    service.release(Op::List);
    first.await.unwrap();

    manager.initialize(EMAIL).await;
    assert_eq!(service.calls(Op::List), 1);
    assert_eq!(manager.snapshot().phase, Phase::Ready);
    assert_eq!(manager.snapshot().keys.len(), 1);
}

#[tokio::test]
async fn initialize_retries_after_error() {
    let (manager, service) = setup(scenario_list());
    service.push_list(Err(500));
    manager.initialize(EMAIL).await;
    assert_eq!(manager.snapshot().phase, Phase::Error);

    manager.initialize(EMAIL).await;
    assert_eq!(manager.snapshot().phase, Phase::Ready);
    assert_eq!(service.calls(Op::List), 2);
}

#[tokio::test]
async fn blank_email_is_ignored() {
    let (manager, service) = setup(scenario_list());
    manager.initialize("   ").await;
    assert_eq!(manager.snapshot().phase, Phase::Uninitialized);
    assert_eq!(service.calls(Op::List), 0);
}

// ---- Background refresh ----

#[tokio::test]
async fn background_failure_is_silent() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    let before = manager.snapshot().keys;
    service.push_list(Err(503));

    manager.refresh_in_background().await;

    let state = manager.snapshot();
    assert!(state.error.is_none());
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.keys, before);
    assert!(!state.background_refreshing);
}

#[tokio::test]
async fn background_success_replaces_list_without_loading() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    service.set_default_list(vec![
        item("sk_one00000001", "2024-01-01T00:00:00Z"),
        item("sk_two00000002", "2024-01-02T00:00:00Z"),
    ]);
    service.hold(Op::List);

    let refresh = tokio::spawn({
        let manager = manager.clone();
        async move { manager.refresh_in_background().await }
    });
    until(|| manager.snapshot().background_refreshing).await;
    assert_eq!(manager.snapshot().phase, Phase::Ready);

    service.release(Op::List);
    refresh.await.unwrap();

    let state = manager.snapshot();
    assert!(!state.background_refreshing);
    assert_eq!(state.keys.len(), 2);
    assert_eq!(state.keys[1].name, "API Key 2");
}

#[tokio::test(start_paused = true)]
async fn timer_refreshes_every_interval() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));

    manager.mount(&Session::signed_in(EMAIL)).await;
    assert!(manager.background_refresh_running());
    assert_eq!(service.calls(Op::List), 1);

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(service.calls(Op::List), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(service.calls(Op::List), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.calls(Op::List), 3);
}

#[tokio::test(start_paused = true)]
async fn timer_failure_never_reaches_the_banner() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));
    manager.mount(&Session::signed_in(EMAIL)).await;

    service.push_list(Err(500));
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(service.calls(Op::List), 2);
    let state = manager.snapshot();
    assert!(state.error.is_none());
    assert_eq!(state.keys.len(), 1);
    assert!(!state.background_refreshing);
}

#[tokio::test(start_paused = true)]
async fn tick_is_skipped_while_background_refresh_is_out() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));
    manager.mount(&Session::signed_in(EMAIL)).await;
    service.hold(Op::List);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(service.calls(Op::List), 2);
    assert!(manager.snapshot().background_refreshing);

    // Two more periods pass with the first tick's request still parked.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(service.calls(Op::List), 2);
    assert!(manager.snapshot().background_refreshing);

    service.release(Op::List);
    until(|| !manager.snapshot().background_refreshing).await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.calls(Op::List), 3);
}

#[tokio::test(start_paused = true)]
async fn tick_is_skipped_while_first_load_runs() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));
    manager.start_background_refresh();
    service.hold(Op::List);

    let loading = manager.clone();
    let init = tokio::spawn(async move { loading.initialize(EMAIL).await });
    until(|| service.calls(Op::List) == 1).await;
    assert_eq!(manager.snapshot().phase, Phase::Loading);

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(service.calls(Op::List), 1);
    assert!(!manager.snapshot().background_refreshing);

    service.release(Op::List);
    init.await.unwrap();
    assert_eq!(manager.snapshot().phase, Phase::Ready);
}

#[tokio::test(start_paused = true)]
async fn tick_is_skipped_during_post_create_refresh() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));
    manager.mount(&Session::signed_in(EMAIL)).await;
    assert!(manager.open_create_dialog());
    service.push_create_key(Ok(created("sk_NEWSECRET1234")));
    service.hold(Op::List);

    let creating = manager.clone();
    let create = tokio::spawn(async move { creating.create_key("CI").await });
    until(|| service.calls(Op::List) == 2).await;
    assert!(manager.snapshot().background_refreshing);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(service.calls(Op::List), 2);

    service.release(Op::List);
    create.await.unwrap();
    let state = manager.snapshot();
    assert!(!state.creating);
    assert!(!state.background_refreshing);
    assert!(state.pending_reveal.is_some());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_timer() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));
    manager.mount(&Session::signed_in(EMAIL)).await;

    manager.shutdown();
    assert!(!manager.background_refresh_running());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(service.calls(Op::List), 1);
}

#[tokio::test(start_paused = true)]
async fn signing_out_stops_timer_and_clears_state() {
    let service = Arc::new(ScriptedKeyService::new().with_default_list(scenario_list()));
    let manager = KeyManager::with_refresh_interval(service.clone(), Duration::from_secs(30));
    manager.mount(&Session::signed_in(EMAIL)).await;

    manager.set_identity(None).await;

    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Uninitialized);
    assert!(state.keys.is_empty());
    assert!(state.email.is_none());
    assert!(!manager.background_refresh_running());

    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(service.calls(Op::List), 1);
}

#[tokio::test]
async fn signed_out_mount_does_nothing() {
    let (manager, service) = setup(scenario_list());
    manager.mount(&Session::signed_out()).await;
    assert_eq!(manager.snapshot().phase, Phase::Uninitialized);
    assert!(!manager.background_refresh_running());
    assert_eq!(service.calls(Op::CreateUser), 0);
}

#[tokio::test]
async fn switching_identity_discards_previous_keys() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    service.set_default_list(Vec::new());

    manager.initialize("b@y.com").await;

    let state = manager.snapshot();
    assert_eq!(state.email.as_deref(), Some("b@y.com"));
    assert!(state.keys.is_empty());
    assert_eq!(service.emails().last().map(String::as_str), Some("b@y.com"));
}

#[tokio::test]
async fn stale_background_fetch_does_not_clear_syncing() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    service.hold(Op::List);

    // Started for the first user, still out when the identity changes.
    let stale = manager.clone();
    tokio::spawn(async move { stale.refresh_in_background().await });
    until(|| service.calls(Op::List) == 2).await;

    manager.set_identity(None).await;
    let fresh = manager.clone();
    tokio::spawn(async move { fresh.initialize("b@y.com").await });
    until(|| service.calls(Op::List) == 3).await;

    let first = manager.clone();
    tokio::spawn(async move { first.refresh_in_background().await });
    until(|| service.calls(Op::List) == 4).await;

    // Stale fetch and the new user's first load land.
    service.release(Op::List);
    service.release(Op::List);
    until(|| manager.snapshot().phase == Phase::Ready).await;
    assert!(manager.snapshot().background_refreshing);

    let second = manager.clone();
    tokio::spawn(async move { second.refresh_in_background().await });
    until(|| service.calls(Op::List) == 5).await;

    service.release(Op::List);
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert!(manager.snapshot().background_refreshing);

    service.release(Op::List);
    until(|| !manager.snapshot().background_refreshing).await;
}

// ---- Create ----

#[tokio::test]
async fn scenario_create_reveals_secret_and_refreshes_once() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    assert!(manager.open_create_dialog());
    service.push_create_key(Ok(created("sk_NEWSECRET1234")));
    let lists_before = service.calls(Op::List);

    manager.create_key("My Test App").await;

    let state = manager.snapshot();
    let reveal = state.pending_reveal.as_ref().unwrap();
    assert_eq!(reveal.secret, "sk_NEWSECRET1234");
    assert_eq!(reveal.name, "My Test App");
    assert!(!state.create_dialog_open);
    assert!(!state.creating);
    assert_eq!(service.calls(Op::List), lists_before + 1);

    assert!(manager.dismiss_reveal());
    assert!(manager.snapshot().pending_reveal.is_none());
    assert_eq!(service.calls(Op::List), lists_before + 1);
}

#[tokio::test]
async fn create_failure_keeps_dialog_open() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    manager.open_create_dialog();
    service.push_create_key(Err(500));

    manager.create_key("Broken").await;

    let state = manager.snapshot();
    assert!(state.create_dialog_open);
    assert_eq!(state.error.as_deref(), Some(CREATE_FAILED));
    assert!(state.pending_reveal.is_none());
    assert!(!state.creating);
}

#[tokio::test]
async fn second_create_while_pending_is_dropped() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    service.push_create_key(Ok(created("sk_NEWSECRET1234")));
    service.hold(Op::CreateKey);

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.create_key("first").await }
    });
    until(|| service.calls(Op::CreateKey) == 1).await;
    assert!(manager.snapshot().creating);
    assert!(!manager.close_create_dialog());

    manager.create_key("second").await;
    assert_eq!(service.calls(Op::CreateKey), 1);

    service.release(Op::CreateKey);
    first.await.unwrap();
    let state = manager.snapshot();
    assert!(!state.creating);
    assert_eq!(state.pending_reveal.unwrap().name, "first");
}

#[tokio::test]
async fn blank_name_never_calls_the_service() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    manager.create_key("   ").await;
    assert_eq!(service.calls(Op::CreateKey), 0);
}

#[tokio::test]
async fn create_dialog_needs_a_loaded_list() {
    let (manager, _service) = setup(scenario_list());
    assert!(!manager.open_create_dialog());
    manager.initialize(EMAIL).await;
    assert!(manager.open_create_dialog());
    assert!(manager.close_create_dialog());
    assert!(!manager.snapshot().create_dialog_open);
}

#[tokio::test]
async fn list_refresh_renames_created_key_to_placeholder() {
    let (manager, service) = setup(Vec::new());
    manager.initialize(EMAIL).await;
    service.push_create_key(Ok(created("sk_NEWSECRET1234")));
    service.set_default_list(vec![item("sk_NEWSECRET1234", "2023-11-14T22:13:20Z")]);

    manager.create_key("My Test App").await;

    let state = manager.snapshot();
    assert_eq!(state.keys.len(), 1);
    assert_eq!(state.keys[0].name, "API Key 1");
}

// ---- Delete ----

#[tokio::test]
async fn delete_is_keyed_by_secret() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    let key = manager.snapshot().keys[0].clone();
    service.set_default_list(Vec::new());

    assert!(manager.request_delete(key));
    manager.confirm_delete().await;

    assert_eq!(service.deleted(), vec!["sk_abc123...wxyz".to_string()]);
    let state = manager.snapshot();
    assert!(state.pending_delete.is_none());
    assert!(!state.deleting);
    assert!(state.keys.is_empty());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn scenario_delete_failure_keeps_dialog_and_list() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    let before = manager.snapshot().keys;
    manager.request_delete(before[0].clone());
    service.push_delete(Err(500));
    let lists_before = service.calls(Op::List);

    manager.confirm_delete().await;

    let state = manager.snapshot();
    assert_eq!(state.pending_delete.as_ref().unwrap().secret, "sk_abc123...wxyz");
    assert_eq!(state.error.as_deref(), Some(DELETE_FAILED));
    assert_eq!(state.keys, before);
    assert!(!state.deleting);
    assert_eq!(service.calls(Op::List), lists_before);
}

#[tokio::test]
async fn second_delete_while_pending_is_dropped() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    manager.request_delete(manager.snapshot().keys[0].clone());
    service.hold(Op::Delete);

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.confirm_delete().await }
    });
    until(|| service.calls(Op::Delete) == 1).await;
    assert!(manager.snapshot().deleting);
    assert!(!manager.cancel_delete());

    manager.confirm_delete().await;
    assert_eq!(service.calls(Op::Delete), 1);

    service.release(Op::Delete);
    first.await.unwrap();
    assert!(!manager.snapshot().deleting);
    assert!(manager.snapshot().pending_delete.is_none());
}

#[tokio::test]
async fn confirm_without_selection_is_a_no_op() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    manager.confirm_delete().await;
    assert_eq!(service.calls(Op::Delete), 0);
    assert!(!manager.snapshot().deleting);
}

#[tokio::test]
async fn cancel_delete_closes_dialog() {
    let (manager, _service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    manager.request_delete(manager.snapshot().keys[0].clone());
    assert!(manager.cancel_delete());
    assert!(manager.snapshot().pending_delete.is_none());
}

// ---- Lifecycle ----

#[tokio::test]
async fn results_after_shutdown_are_discarded() {
    let (manager, service) = setup(scenario_list());
    service.hold(Op::List);

    let init = tokio::spawn({
        let manager = manager.clone();
        async move { manager.initialize(EMAIL).await }
    });
    until(|| service.calls(Op::List) == 1).await;

    manager.shutdown();
    service.release(Op::List);
    init.await.unwrap();

    let state = manager.snapshot();
    assert_eq!(state.phase, Phase::Loading);
    assert!(state.keys.is_empty());
    assert!(!manager.is_mounted());
}

#[tokio::test]
async fn subscribers_see_changes() {
    let (manager, _service) = setup(scenario_list());
    let mut rx = manager.subscribe();

    manager.initialize(EMAIL).await;

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.phase, Phase::Ready);
}

#[tokio::test]
async fn delete_response_body_is_not_inspected() {
    let (manager, service) = setup(scenario_list());
    manager.initialize(EMAIL).await;
    manager.request_delete(manager.snapshot().keys[0].clone());
    service.push_delete(Ok(StatusResponse {
        status_code: 404,
        message: "odd but 2xx".into(),
    }));

    manager.confirm_delete().await;

    assert!(manager.snapshot().pending_delete.is_none());
    assert!(manager.snapshot().error.is_none());
}
