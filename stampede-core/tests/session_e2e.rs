//! End-to-end session scenario against a canned transport: a full bootstrap
//! followed by one browse-flow iteration, asserting the exact call sequence.

use serde_json::json;
use stampede_config::TargetConfig;
use stampede_core::{FlowCatalog, RegexExtractor, SessionError, VirtualUser};
use stampede_http::MockTransport;
use std::sync::Arc;

const LOGIN_PAGE: &str =
    r#"<form><input type="hidden" name="csrf_token" value="deadbeef"/></form>"#;

const LANDING_PAGE: &str = concat!(
    r#"odoo.session_info = {"uid": 7, "company_id": 1, "#,
    r#""user_context": {"lang": "en_US", "tz": "UTC"}, "#,
    r#""cache_hashes": {"load_menus": "4fb40f1"}};"#
);

fn target() -> TargetConfig {
    TargetConfig {
        host: "http://odoo.test:8069".to_string(),
        login: "demo".to_string(),
        password: "demo".to_string(),
        menu_label: "CRM".to_string(),
    }
}

fn mock_bootstrap() -> Arc<MockTransport> {
    let mock = Arc::new(MockTransport::new());
    mock.on_text("GET", "/web/login", LOGIN_PAGE);
    mock.on_status("POST", "/web/login", 200);
    mock.on_text("GET", "/web", LANDING_PAGE);
    mock.on_json(
        "GET",
        "/web/webclient/load_menus/4fb40f1",
        json!({"children": [
            {"name": "Discuss", "action": "ir.actions.act_window,7"},
            {"name": "CRM", "action": "ir.actions.act_window,42"},
        ]}),
    );
    mock.on_json(
        "POST",
        "/web/dataset/call_kw/res.users/systray_get_activities",
        json!({"result": []}),
    );
    mock.on_status("GET", "/web/image", 200);
    mock.on_json(
        "POST",
        "/web/action/run",
        json!({"result": {"context": {"default_team_id": 5}}}),
    );
    mock
}

async fn bootstrap_user(mock: Arc<MockTransport>) -> VirtualUser {
    VirtualUser::bootstrap(
        0,
        mock,
        Arc::new(RegexExtractor),
        &target(),
        Arc::new(FlowCatalog::with_builtin()),
        Some(7),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_bootstrap_then_kanban_call_sequence() {
    let mock = mock_bootstrap();
    mock.on_json(
        "POST",
        "/web/dataset/call_kw/crm.lead/read_progress_bar",
        json!({"result": {}}),
    );
    mock.on_json(
        "POST",
        "/web/dataset/call_kw/crm.lead/web_read_group",
        json!({"result": {"groups": [
            {"stage_id": [1, "New"]},
            {"stage_id": [2, "Won"]},
        ]}}),
    );
    mock.on_json(
        "POST",
        "/web/dataset/search_read",
        json!({"result": {"length": 0, "records": []}}),
    );

    let mut user = bootstrap_user(mock.clone()).await;
    assert_eq!(user.context().user_id, 7);
    assert_eq!(user.context().company_id, 1);
    assert_eq!(user.context().allowed_company_ids, vec![1]);
    assert_eq!(user.context().primary_action_id, 42);

    user.run_flow("crm_kanban").await.unwrap();
    assert_eq!(user.context().user_id, 7);

    let paths: Vec<String> = mock.calls().into_iter().map(|call| call.path).collect();
    assert_eq!(
        paths,
        vec![
            "/web/login",
            "/web/login",
            "/web",
            "/web/webclient/load_menus/4fb40f1",
            "/web/dataset/call_kw/res.users/systray_get_activities",
            "/web/image",
            "/web/action/run",
            // Flow iteration starts here
            "/web/action/run",
            "/web/dataset/call_kw/crm.lead/read_progress_bar",
            "/web/dataset/call_kw/crm.lead/web_read_group",
            "/web/dataset/search_read",
            "/web/dataset/search_read",
        ]
    );
}

#[tokio::test]
async fn test_rejected_login_is_fatal() {
    let mock = Arc::new(MockTransport::new());
    mock.on_text("GET", "/web/login", LOGIN_PAGE);
    mock.on_status("POST", "/web/login", 403);

    let err = VirtualUser::bootstrap(
        0,
        mock,
        Arc::new(RegexExtractor),
        &target(),
        Arc::new(FlowCatalog::with_builtin()),
        Some(7),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SessionError::Auth(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_missing_token_is_fatal() {
    let mock = Arc::new(MockTransport::new());
    mock.on_text("GET", "/web/login", "<html>maintenance page</html>");

    let err = VirtualUser::bootstrap(
        0,
        mock,
        Arc::new(RegexExtractor),
        &target(),
        Arc::new(FlowCatalog::with_builtin()),
        Some(7),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SessionError::Bootstrap(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_missing_menu_entry_is_fatal() {
    let mock = Arc::new(MockTransport::new());
    mock.on_text("GET", "/web/login", LOGIN_PAGE);
    mock.on_status("POST", "/web/login", 200);
    mock.on_text("GET", "/web", LANDING_PAGE);
    mock.on_json(
        "GET",
        "/web/webclient/load_menus/4fb40f1",
        json!({"children": [{"name": "Discuss", "action": "ir.actions.act_window,7"}]}),
    );

    let err = VirtualUser::bootstrap(
        0,
        mock,
        Arc::new(RegexExtractor),
        &target(),
        Arc::new(FlowCatalog::with_builtin()),
        Some(7),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SessionError::MenuNotFound(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_unknown_flow_is_not_fatal() {
    let mock = mock_bootstrap();
    let mut user = bootstrap_user(mock).await;
    let err = user.run_flow("does_not_exist").await.unwrap_err();
    assert!(matches!(err, SessionError::DataAssumption(_)));
    assert!(!err.is_fatal());
}
