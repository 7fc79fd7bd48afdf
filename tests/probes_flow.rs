mod common;

use serde_json::json;
use shop_probe::{
    dto::{
        auth::LoginRequest,
        sync::{CartEntry, FavoriteEntry, ItemId, SyncPayload},
    },
    probes::{Probe, ProbeDetail, SmokePlan, smoke},
    schema::SchemaFinding,
};

#[tokio::test]
async fn login_decodes_token_claims() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let run = Probe::Login(LoginRequest::new(common::USER, common::PASSWORD))
        .run(&backend.client())
        .await?;

    assert!(run.is_success());
    let ProbeDetail::Login(detail) = &run.detail else {
        panic!("expected login detail");
    };
    let info = detail.token.as_ref().expect("token decoded");
    assert_eq!(info.claims.sub, Some(json!("1")));
    assert_eq!(info.claims.role.as_deref(), Some("user"));
    assert_eq!(info.claims.extra["email"], "alice@example.com");
    assert!(!info.claims.is_expired(chrono::Utc::now()));
    assert!(detail.token_error.is_none());
    Ok(())
}

#[tokio::test]
async fn rejected_login_surfaces_status_and_body() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let run = Probe::Login(LoginRequest::new(common::USER, "wrong"))
        .run(&backend.client())
        .await?;

    assert_eq!(run.report.status, 401);
    assert!(!run.is_success());
    assert_eq!(
        run.report.json(),
        Some(&json!({ "message": "Invalid credentials" }))
    );
    let ProbeDetail::Login(detail) = &run.detail else {
        panic!("expected login detail");
    };
    assert!(detail.token.is_none());
    assert!(run.to_string().contains("token: none in response"));
    Ok(())
}

#[tokio::test]
async fn orders_are_counted_and_schema_checked() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let run = Probe::Orders {
        user_id: "1".into(),
        check_schema: true,
    }
    .run(&backend.client())
    .await?;

    let ProbeDetail::Orders(detail) = &run.detail else {
        panic!("expected orders detail");
    };
    assert_eq!(detail.count, 2);
    assert_eq!(detail.line_items, 2);
    assert!(detail.has_errors());

    // only the second record deviates
    assert_eq!(detail.findings.len(), 1);
    let (index, findings) = &detail.findings[0];
    assert_eq!(*index, 1);
    assert!(
        findings
            .iter()
            .any(|f| matches!(f, SchemaFinding::ItemsNotJson(_)))
    );
    assert!(findings.contains(&SchemaFinding::UnexpectedStatus("lost".into())));
    assert!(findings.contains(&SchemaFinding::ExtraField("coupon".into())));
    Ok(())
}

#[tokio::test]
async fn unknown_user_orders_keep_text_body() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let report = backend.client().user_orders("99").await?;

    assert_eq!(report.status, 404);
    assert_eq!(report.body.raw(), "Cannot GET /api/orders/user/99");
    assert!(report.json().is_none());
    Ok(())
}

#[tokio::test]
async fn sync_push_without_version_bumps_current() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let payload = SyncPayload {
        favorites: vec!["7:Ferris Mug".parse::<FavoriteEntry>().unwrap()],
        cart: vec!["7:2".parse::<CartEntry>().unwrap()],
        version: 0,
    };

    let run = Probe::SyncPush {
        user_id: "1".into(),
        payload,
        version: None,
    }
    .run(&backend.client())
    .await?;

    assert_eq!(run.report.status, 200);
    let ProbeDetail::SyncPush(detail) = &run.detail else {
        panic!("expected sync detail");
    };
    assert_eq!(detail.fetched_version, Some(3));
    assert_eq!(detail.version_sent, 4);

    let pushes = backend.state.pushes.lock().unwrap().clone();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].version, 4);
    assert_eq!(pushes[0].cart[0].id, ItemId::Number(7));
    assert_eq!(pushes[0].cart[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn sync_push_for_new_user_starts_at_one() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let run = Probe::SyncPush {
        user_id: "42".into(),
        payload: SyncPayload::default(),
        version: None,
    }
    .run(&backend.client())
    .await?;

    assert!(run.is_success());
    let ProbeDetail::SyncPush(detail) = &run.detail else {
        panic!("expected sync detail");
    };
    assert_eq!(detail.fetched_version, Some(0));
    assert_eq!(detail.version_sent, 1);

    let stored = backend.client().fetch_sync("42").await?;
    let stored: SyncPayload = stored.decode()?;
    assert_eq!(stored.version, 1);
    Ok(())
}

#[tokio::test]
async fn stale_version_conflict_is_reported_not_raised() -> anyhow::Result<()> {
    let backend = common::spawn_backend().await;
    let run = Probe::SyncPush {
        user_id: "1".into(),
        payload: SyncPayload::default(),
        version: Some(2),
    }
    .run(&backend.client())
    .await?;

    assert_eq!(run.report.status, 409);
    assert_eq!(run.report.json().map(|b| b["version"].clone()), Some(json!(3)));
    Ok(())
}

#[tokio::test]
async fn smoke_runs_every_step_in_order() {
    let backend = common::spawn_backend().await;
    let plan = SmokePlan {
        login: Some(LoginRequest::new(common::USER, common::PASSWORD)),
        user_id: Some("1".into()),
        check_schema: false,
    };

    let steps = smoke(&backend.client(), &plan).await;
    let names: Vec<_> = steps.iter().map(|s| s.name).collect();
    assert_eq!(names, ["health", "login", "orders", "sync-get"]);
    assert!(steps.iter().all(|s| s.passed()));
}

#[tokio::test]
async fn smoke_continues_past_failures() {
    let backend = common::spawn_backend().await;
    let plan = SmokePlan {
        login: Some(LoginRequest::new("mallory", "nope")),
        user_id: Some("99".into()),
        check_schema: true,
    };

    let steps = smoke(&backend.client(), &plan).await;
    assert_eq!(steps.len(), 4);
    assert!(steps[0].passed());
    assert!(steps[1..].iter().all(|s| !s.passed()));
    assert!(steps[1].to_string().contains("FAIL 401"));
}
