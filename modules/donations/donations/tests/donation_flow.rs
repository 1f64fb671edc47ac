#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Donation lifecycle against SQLite: init, webhook settlement, receipts.

mod common;

use std::sync::Arc;

use common::{FailingGateway, TestEnv};
use donations::domain::error::DomainError;
use donations::domain::service::WebhookOutcome;
use donations_sdk::{CauseStatus, CauseType, DonationRequest, DonationStatus, NewCause};
use marketplace_security::{Role, SecurityContext};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

fn request(cause_id: Uuid, amount: Decimal) -> DonationRequest {
    DonationRequest {
        cause_id,
        amount,
        currency: None,
    }
}

fn webhook(event: &str, order_id: &str, payment_id: &str) -> Vec<u8> {
    json!({
        "event": event,
        "payload": { "payment": { "entity": { "id": payment_id, "order_id": order_id } } }
    })
    .to_string()
    .into_bytes()
}

async fn raised(env: &TestEnv, cause_id: Uuid) -> Decimal {
    env.services
        .catalog
        .get_public_cause(cause_id)
        .await
        .expect("cause")
        .raised_amount
}

async fn donate(env: &TestEnv, donor: &SecurityContext, amount: Decimal) -> (Uuid, String) {
    let init = env
        .services
        .donations
        .init(donor, request(env.seed.cause_id, amount))
        .await
        .expect("init donation");
    (init.donation_id, init.order_id)
}

#[tokio::test]
async fn test_init_returns_gateway_order_in_minor_units() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;

    let init = env
        .services
        .donations
        .init(&donor, request(env.seed.cause_id, Decimal::new(50_050, 2)))
        .await
        .unwrap();

    assert_eq!(init.amount_minor, 50_050);
    assert_eq!(init.currency, "INR");
    assert_eq!(init.order_id, format!("test_order_{}", init.donation_id));
    assert_eq!(init.key_id, "test_key");

    let mine = env.services.donations.list_mine(&donor).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, DonationStatus::Init);
    assert_eq!(mine[0].pg_order_id.as_deref(), Some(init.order_id.as_str()));
    assert_eq!(mine[0].tenant_id, env.hope());
}

#[tokio::test]
async fn test_captured_webhook_credits_cause_exactly_once() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;
    let (donation_id, order_id) = donate(&env, &donor, Decimal::new(50_000, 2)).await;
    let body = webhook("payment.captured", &order_id, "pay_1");

    let first = env.services.donations.handle_webhook(&body, Some("sig")).await.unwrap();
    assert_eq!(first, WebhookOutcome::Captured { donation_id });
    assert_eq!(raised(&env, env.seed.cause_id).await, Decimal::new(500, 0));

    let again = env.services.donations.handle_webhook(&body, Some("sig")).await.unwrap();
    assert_eq!(again, WebhookOutcome::Duplicate { donation_id });
    assert_eq!(raised(&env, env.seed.cause_id).await, Decimal::new(500, 0));

    // A late failure for an already captured order changes nothing either.
    let late = webhook("payment.failed", &order_id, "pay_1");
    let outcome = env.services.donations.handle_webhook(&late, None).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Duplicate { donation_id });

    let mine = env.services.donations.list_mine(&donor).await.unwrap();
    assert_eq!(mine[0].status, DonationStatus::Captured);
    assert_eq!(mine[0].pg_payment_id.as_deref(), Some("pay_1"));
}

#[tokio::test]
async fn test_failed_webhook_leaves_raised_amount_untouched() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;
    let (donation_id, order_id) = donate(&env, &donor, Decimal::new(1_000, 2)).await;

    let outcome = env
        .services
        .donations
        .handle_webhook(&webhook("payment.failed", &order_id, "pay_2"), None)
        .await
        .unwrap();

    assert_eq!(outcome, WebhookOutcome::Failed { donation_id });
    assert_eq!(raised(&env, env.seed.cause_id).await, Decimal::ZERO);
    let err = env.services.donations.receipt(&donor, donation_id).await.unwrap_err();
    assert!(matches!(err, DomainError::BadRequest(ref m) if m == "Donation not completed"), "{err}");
}

#[tokio::test]
async fn test_unrelated_events_and_unknown_orders_are_acknowledged() {
    let env = TestEnv::new().await;

    let unknown = env
        .services
        .donations
        .handle_webhook(&webhook("payment.captured", "order_missing", "pay_x"), None)
        .await
        .unwrap();
    assert_eq!(
        unknown,
        WebhookOutcome::UnknownOrder {
            order_id: "order_missing".to_owned()
        }
    );

    let ignored = env
        .services
        .donations
        .handle_webhook(&webhook("refund.created", "order_missing", "pay_x"), None)
        .await
        .unwrap();
    assert_eq!(
        ignored,
        WebhookOutcome::Ignored {
            event: "refund.created".to_owned()
        }
    );
}

#[tokio::test]
async fn test_malformed_webhook_body_is_rejected() {
    let env = TestEnv::new().await;

    let err = env.services.donations.handle_webhook(b"not json", None).await.unwrap_err();
    assert!(matches!(err, DomainError::BadRequest(ref m) if m == "Invalid JSON payload"), "{err}");

    let err = env
        .services
        .donations
        .handle_webhook(br#"{"payload":{}}"#, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::BadRequest(_)), "{err}");
}

#[tokio::test]
async fn test_init_requires_live_cause_and_positive_amount() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let category = env.services.catalog.list_categories().await.unwrap()[0].id;
    let draft = env
        .services
        .catalog
        .create_cause(
            &admin,
            NewCause {
                tenant_id: env.hope(),
                category_id: category,
                title: "Winter Blankets".to_owned(),
                description: None,
                goal_amount: Decimal::new(200_000, 2),
                cause_type: CauseType::NgoManaged,
                policy_flags: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(draft.status, CauseStatus::Draft);

    let err = env
        .services
        .donations
        .init(&donor, request(draft.id, Decimal::ONE_HUNDRED))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }), "{err}");

    let err = env
        .services
        .donations
        .init(&donor, request(Uuid::now_v7(), Decimal::ONE_HUNDRED))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }), "{err}");

    let err = env
        .services
        .donations
        .init(&donor, request(env.seed.cause_id, Decimal::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "amount", .. }), "{err}");

    assert!(env.services.donations.list_mine(&donor).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gateway_failure_marks_donation_failed() {
    let env = TestEnv::with_gateway(Arc::new(FailingGateway)).await;
    let donor = env.ctx(Role::Donor).await;

    let err = env
        .services
        .donations
        .init(&donor, request(env.seed.cause_id, Decimal::ONE_HUNDRED))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Gateway(_)), "{err}");

    let mine = env.services.donations.list_mine(&donor).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, DonationStatus::Failed);
    assert_eq!(mine[0].pg_order_id, None);
}

#[tokio::test]
async fn test_receipt_only_for_own_captured_donation() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;
    let (donation_id, order_id) = donate(&env, &donor, Decimal::new(25_000, 2)).await;

    let err = env.services.donations.receipt(&donor, donation_id).await.unwrap_err();
    assert!(matches!(err, DomainError::BadRequest(_)), "{err}");

    env.services
        .donations
        .handle_webhook(&webhook("payment.captured", &order_id, "pay_9"), None)
        .await
        .unwrap();

    let receipt = env.services.donations.receipt(&donor, donation_id).await.unwrap();
    assert_eq!(receipt.donation_id, donation_id);
    assert_eq!(receipt.amount, Decimal::new(250, 0));
    assert_eq!(receipt.cause_title, "Emergency Food Relief");
    assert_eq!(receipt.donor_name, "Arya Donor");
    assert_eq!(receipt.donor_email, "donor.arya@example.com");
    assert_eq!(receipt.payment_id.as_deref(), Some("pay_9"));

    let staff = env.ctx(Role::NgoStaff).await;
    let err = env.services.donations.receipt(&staff, donation_id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn test_settlement_is_audited() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;
    let (donation_id, order_id) = donate(&env, &donor, Decimal::ONE_HUNDRED).await;
    env.services
        .donations
        .handle_webhook(&webhook("payment.captured", &order_id, "pay_3"), None)
        .await
        .unwrap();

    let admin = env.ctx(Role::PlatformAdmin).await;
    let entries = env
        .services
        .audit
        .list(&admin, Some("donation"), Some(donation_id))
        .await
        .unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["webhook", "init"]);
    assert_eq!(entries[0].actor_id, None);
    assert_eq!(entries[1].actor_id, Some(donor.subject_id()));

    let err = env.services.audit.list(&donor, None, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)), "{err}");
}

#[tokio::test]
async fn test_init_rejects_amounts_outside_money_range() {
    let env = TestEnv::new().await;
    let donor = env.ctx(Role::Donor).await;

    for amount in [
        Decimal::MAX,
        Decimal::new(10_000_000_000_000, 0),
        Decimal::new(1, 3),
        Decimal::new(10_005, 3),
    ] {
        let err = env
            .services
            .donations
            .init(&donor, request(env.seed.cause_id, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "amount", .. }), "{amount}: {err}");
    }
    assert!(env.services.donations.list_mine(&donor).await.unwrap().is_empty());

    // Trailing zeros are still whole paise.
    let init = env
        .services
        .donations
        .init(&donor, request(env.seed.cause_id, Decimal::new(10_000, 3)))
        .await
        .unwrap();
    assert_eq!(init.amount_minor, 1_000);
}

#[tokio::test]
async fn test_tenant_donations_are_scoped_to_ngo_members() {
    let env = TestEnv::new().await;
    let care = env.care_works().await;
    let donor = env.ctx(Role::Donor).await;
    let (hope_donation, order_id) = donate(&env, &donor, Decimal::ONE_HUNDRED).await;
    let care_donation = env
        .services
        .donations
        .init(&donor, request(care.cause_id, Decimal::TEN))
        .await
        .unwrap()
        .donation_id;
    env.services
        .donations
        .handle_webhook(&webhook("payment.captured", &order_id, "pay_t"), None)
        .await
        .unwrap();

    for role in [Role::NgoAdmin, Role::NgoStaff] {
        let ctx = env.ctx(role).await;
        let seen = env.services.donations.list_for_tenants(&ctx, None).await.unwrap();
        let ids: Vec<Uuid> = seen.iter().map(|d| d.id).collect();
        assert_eq!(ids, [hope_donation], "{role}");
    }

    let care_seen = env.services.donations.list_for_tenants(&care.admin, None).await.unwrap();
    assert_eq!(care_seen.len(), 1);
    assert_eq!(care_seen[0].id, care_donation);
    assert_eq!(care_seen[0].donor_user_id, donor.subject_id());

    let platform = env.ctx(Role::PlatformAdmin).await;
    assert_eq!(env.services.donations.list_for_tenants(&platform, None).await.unwrap().len(), 2);
    let captured = env
        .services
        .donations
        .list_for_tenants(&platform, Some(DonationStatus::Captured))
        .await
        .unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].id, hope_donation);

    for ctx in [donor, env.ctx(Role::Vendor).await] {
        let err = env.services.donations.list_for_tenants(&ctx, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)), "{err}");
    }
}
