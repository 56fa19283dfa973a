//! Integration tests for the page telemetry bootstrap

mod test_utils;

use pageinsights_telemetry::config::{load_overrides, ConfigPaths};
use pageinsights_telemetry::{
    Bootstrapper, ConfigOverrides, EffectiveConfig, SessionState, TelemetryItem,
};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use test_utils::{sample_page, ClearedEnv, RecordingFactory, SdkCall};

fn bootstrapper(
    overrides: ConfigOverrides,
    factory: RecordingFactory,
) -> Bootstrapper<pageinsights_telemetry::StaticPageContext, RecordingFactory> {
    Bootstrapper::new(EffectiveConfig::default(), overrides, sample_page(), factory)
}

#[tokio::test]
async fn test_active_session_runs_in_order() {
    let factory = RecordingFactory::default();
    let mut bootstrapper = bootstrapper(ConfigOverrides::default(), factory.clone());

    bootstrapper.on_init().await.unwrap();

    let SessionState::Active(session) = bootstrapper.state() else {
        panic!("expected an active session");
    };
    let calls = &session.sdk().calls;
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], SdkCall::Load);
    assert_eq!(calls[1], SdkCall::AddInitializer);
    assert_eq!(
        calls[2],
        SdkCall::SetAuthenticatedUser {
            user_id: "i0#.fmembershipadele.vance@contoso.com".to_string(),
            account_id: Some("i0#.fmembershipadele.vance@contoso.com".to_string()),
        }
    );
    let SdkCall::TrackPageView(page_view) = &calls[3] else {
        panic!("expected the page view last");
    };
    assert_eq!(page_view.name, "Home");
    assert_eq!(
        page_view.properties.custom_props.user_login_name,
        "i:0#.f|membership|adele.vance@contoso.com"
    );
    assert_eq!(factory.created.borrow().len(), 1);
}

#[tokio::test]
async fn test_sdk_options_carry_derived_values() {
    let factory = RecordingFactory::default();
    let overrides = ConfigOverrides {
        track_exceptions: Some(false),
        excluded_dependency_targets: Some("a\nbusiness.bing.com\n \nmeasure.office.com".to_string()),
        ..Default::default()
    };
    let mut bootstrapper = bootstrapper(overrides, factory.clone());

    bootstrapper.on_init().await.unwrap();

    let SessionState::Active(session) = bootstrapper.state() else {
        panic!("expected an active session");
    };
    assert_eq!(
        session.exclusions().as_slice(),
        ["business.bing.com", "measure.office.com"]
    );

    let created = factory.created.borrow();
    let options = &created[0];
    assert_eq!(
        options.exclude_request_from_auto_tracking_patterns,
        vec!["business.bing.com".to_string(), "measure.office.com".to_string()]
    );
    assert!(options.disable_exception_tracking);
    assert_eq!(
        options.account_id.as_deref(),
        Some("i0#.fmembershipadele.vance@contoso.com")
    );
}

#[tokio::test]
async fn test_registered_initializer_stamps_cloud_role() {
    let mut bootstrapper = bootstrapper(ConfigOverrides::default(), RecordingFactory::default());
    bootstrapper.on_init().await.unwrap();

    let SessionState::Active(session) = bootstrapper.state() else {
        panic!("expected an active session");
    };

    let mut item = TelemetryItem::new("RemoteDependency");
    assert!(session.sdk().run_initializers(&mut item));
    assert_eq!(item.tag("ai.cloud.role"), Some("sharepoint-page"));
    assert_eq!(item.tag("ai.cloud.roleInstance"), None);
}

#[tokio::test]
async fn test_untracked_user_gets_no_identity() {
    let factory = RecordingFactory::default();
    let overrides = ConfigOverrides {
        track_user_id: Some(false),
        ..Default::default()
    };
    let mut bootstrapper = bootstrapper(overrides, factory.clone());

    bootstrapper.on_init().await.unwrap();

    let SessionState::Active(session) = bootstrapper.state() else {
        panic!("expected an active session");
    };
    assert!(session.correlation_token().is_none());
    assert!(!session
        .sdk()
        .calls
        .iter()
        .any(|call| matches!(call, SdkCall::SetAuthenticatedUser { .. })));
    assert!(factory.created.borrow()[0].account_id.is_none());
}

#[tokio::test]
async fn test_disabled_session_builds_nothing() {
    let factory = RecordingFactory::default();
    let overrides = ConfigOverrides {
        enabled: Some(false),
        ..Default::default()
    };
    let mut bootstrapper = bootstrapper(overrides, factory.clone());

    assert!(bootstrapper.on_init().await.is_ok());
    assert!(matches!(bootstrapper.state(), SessionState::Disabled));
    assert!(factory.created.borrow().is_empty());
}

#[tokio::test]
#[serial]
async fn test_config_file_disables_tracking() {
    let _env = ClearedEnv::new();
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".pageinsights")).unwrap();
    fs::write(
        temp_dir.path().join(".pageinsights/config.toml"),
        r#"
[telemetry]
enabled = false
"#,
    )
    .unwrap();

    let overrides = load_overrides(&ConfigPaths::rooted_at(temp_dir.path()), None).unwrap();
    let factory = RecordingFactory::default();
    let mut bootstrapper = bootstrapper(overrides, factory.clone());

    bootstrapper.on_init().await.unwrap();
    assert!(!bootstrapper.is_active());
    assert!(factory.created.borrow().is_empty());
}

#[tokio::test]
#[serial]
async fn test_env_disable_beats_properties() {
    let _env = ClearedEnv::new();
    env::set_var("PAGEINSIGHTS_TELEMETRY_DISABLED", "1");

    let temp_dir = TempDir::new().unwrap();
    let properties = ConfigOverrides::from_json(r#"{"enabled": true}"#).unwrap();
    let overrides =
        load_overrides(&ConfigPaths::rooted_at(temp_dir.path()), Some(properties)).unwrap();

    let mut bootstrapper = bootstrapper(overrides, RecordingFactory::default());
    bootstrapper.on_init().await.unwrap();
    assert!(!bootstrapper.is_active());
}

#[tokio::test]
#[serial]
async fn test_project_file_roles_reach_initializer() {
    let _env = ClearedEnv::new();
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join(".pageinsights")).unwrap();
    fs::write(
        temp_dir.path().join(".pageinsights/config.toml"),
        r#"
[telemetry]
cloudRole = "hr-portal"
"#,
    )
    .unwrap();

    let overrides = load_overrides(&ConfigPaths::rooted_at(temp_dir.path()), None).unwrap();
    let mut bootstrapper = bootstrapper(overrides, RecordingFactory::default());
    bootstrapper.on_init().await.unwrap();

    let SessionState::Active(session) = bootstrapper.state() else {
        panic!("expected an active session");
    };
    let mut item = TelemetryItem::new("PageView");
    session.sdk().run_initializers(&mut item);
    assert_eq!(item.tag("ai.cloud.role"), Some("hr-portal"));
}

#[tokio::test]
async fn test_role_instance_from_properties() {
    let properties =
        ConfigOverrides::from_json(r#"{"cloudRole": "hr-portal", "cloudRoleInstance": "west-eu"}"#)
            .unwrap();
    let mut bootstrapper = bootstrapper(properties, RecordingFactory::default());
    bootstrapper.on_init().await.unwrap();

    let config = bootstrapper.config().unwrap();
    assert_eq!(config.cloud_role, "hr-portal");
    assert_eq!(config.cloud_role_instance, "west-eu");

    let SessionState::Active(session) = bootstrapper.state() else {
        panic!("expected an active session");
    };
    let mut item = TelemetryItem::new("PageView");
    session.sdk().run_initializers(&mut item);
    assert_eq!(item.tag("ai.cloud.role"), Some("hr-portal"));
    assert_eq!(item.tag("ai.cloud.roleInstance"), Some("west-eu"));
}
