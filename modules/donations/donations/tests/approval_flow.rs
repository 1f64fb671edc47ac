#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Invoice and receipt approval, payout creation and settlement.

mod common;

use std::sync::Arc;

use common::{BASE_URL, TestEnv};
use donations::config::DonationsConfig;
use donations::domain::error::DomainError;
use donations::domain::service::Services;
use donations::infra::payments::TestModeGateway;
use donations_sdk::{
    InvoiceStatus, NewNgoReceipt, NewVendorInvoice, PayoutSource, PayoutStatus, PayoutStatusUpdate, PayoutTarget,
    ReceiptStatus, UploadedFile, VendorInvoice,
};
use marketplace_security::{Role, SecurityContext};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use uuid::Uuid;

fn pdf(name: &str, content: &[u8]) -> UploadedFile {
    UploadedFile {
        filename: name.to_owned(),
        content: content.to_vec(),
    }
}

async fn submit_invoice(env: &TestEnv, vendor: &SecurityContext, number: &str) -> VendorInvoice {
    env.services
        .invoices
        .submit(
            vendor,
            NewVendorInvoice {
                cause_id: env.seed.cause_id,
                vendor_id: env.seed.vendor_id,
                number: number.to_owned(),
                amount: Decimal::new(1_250_000, 2),
                files: vec![pdf("invoice 001.pdf", b"%PDF-1.7 rice and lentils")],
            },
        )
        .await
        .expect("submit invoice")
}

fn processed(pg_payout_id: &str) -> PayoutStatusUpdate {
    PayoutStatusUpdate {
        status: PayoutStatus::Processed,
        pg_payout_id: Some(pg_payout_id.to_owned()),
    }
}

#[tokio::test]
async fn test_invoice_submission_records_documents() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;

    let invoice = submit_invoice(&env, &vendor, " INV-001 ").await;

    assert_eq!(invoice.status, InvoiceStatus::Submitted);
    assert_eq!(invoice.number, "INV-001");
    assert_eq!(invoice.tenant_id, env.hope());
    assert_eq!(invoice.currency, "INR");
    assert_eq!(invoice.files.len(), 1);
    let file = &invoice.files[0];
    assert_eq!(file.filename, "invoice_001.pdf");
    assert!(file.url.starts_with(&format!("{BASE_URL}/uploads/{}", file.document_id)), "{}", file.url);
    assert!(file.url.ends_with("-invoice_001.pdf"), "{}", file.url);
    assert_eq!(file.sha256, hex::encode(Sha256::digest(b"%PDF-1.7 rice and lentils")));
}

#[tokio::test]
async fn test_invoice_approval_queues_exactly_one_payout() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let invoice = submit_invoice(&env, &vendor, "INV-002").await;

    let outcome = env.services.invoices.approve(&admin, invoice.id).await.unwrap();
    assert_eq!(outcome.id, invoice.id);
    assert_eq!(outcome.status, InvoiceStatus::NgoApproved);
    assert_eq!(outcome.payout.status, PayoutStatus::Queued);
    assert_eq!(outcome.payout.target, PayoutTarget::Vendor(env.seed.vendor_id));
    assert_eq!(outcome.payout.source, PayoutSource::VendorInvoice(invoice.id));
    assert_eq!(outcome.payout.amount, Decimal::new(12_500, 0));
    assert_eq!(outcome.payout.tenant_id, env.hope());

    let err = env.services.invoices.approve(&admin, invoice.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "{err}");

    let platform = env.ctx(Role::PlatformAdmin).await;
    let payouts = env.services.payouts.list(&platform, None).await.unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].id, outcome.payout.id);
}

#[tokio::test]
async fn test_processed_payout_marks_invoice_paid() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let platform = env.ctx(Role::PlatformAdmin).await;
    let invoice = submit_invoice(&env, &vendor, "INV-003").await;
    let payout = env.services.invoices.approve(&admin, invoice.id).await.unwrap().payout;

    let err = env
        .services
        .payouts
        .update_status(&admin, payout.id, processed("pout_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)), "{err}");

    let updated = env
        .services
        .payouts
        .update_status(&platform, payout.id, processed("pout_1"))
        .await
        .unwrap();
    assert_eq!(updated.status, PayoutStatus::Processed);
    assert_eq!(updated.pg_payout_id.as_deref(), Some("pout_1"));

    let paid = env.services.invoices.get(&vendor, invoice.id).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);

    let err = env
        .services
        .payouts
        .update_status(
            &platform,
            payout.id,
            PayoutStatusUpdate {
                status: PayoutStatus::Failed,
                pg_payout_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "{err}");

    let vendor_view = env.services.payouts.get(&vendor, payout.id).await.unwrap();
    assert_eq!(vendor_view.status, PayoutStatus::Processed);
}

#[tokio::test]
async fn test_rejected_invoice_cannot_be_approved() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let invoice = submit_invoice(&env, &vendor, "INV-004").await;

    let rejected = env
        .services
        .invoices
        .reject(&admin, invoice.id, Some("duplicate bill".to_owned()))
        .await
        .unwrap();
    assert_eq!(rejected.status, InvoiceStatus::Rejected);

    let err = env.services.invoices.approve(&admin, invoice.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "{err}");

    let platform = env.ctx(Role::PlatformAdmin).await;
    assert!(env.services.payouts.list(&platform, None).await.unwrap().is_empty());
    let audit = env
        .services
        .audit
        .list(&platform, Some("vendor_invoice"), Some(invoice.id))
        .await
        .unwrap();
    assert_eq!(audit[0].action, "reject");
    assert_eq!(audit[0].after.as_ref().unwrap()["reason"], "duplicate bill");
}

#[tokio::test]
async fn test_staff_and_vendors_cannot_review_invoices() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;
    let staff = env.ctx(Role::NgoStaff).await;
    let invoice = submit_invoice(&env, &vendor, "INV-005").await;

    for caller in [&staff, &vendor] {
        let err = env.services.invoices.approve(caller, invoice.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)), "{err}");
    }
    let err = env.services.invoices.reject(&staff, invoice.id, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)), "{err}");
}

#[tokio::test]
async fn test_invoice_submission_checks_inputs_and_caller() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let care = env.care_works().await;
    let new = |cause_id: Uuid, number: &str, amount: Decimal| NewVendorInvoice {
        cause_id,
        vendor_id: env.seed.vendor_id,
        number: number.to_owned(),
        amount,
        files: Vec::new(),
    };

    let err = env
        .services
        .invoices
        .submit(&vendor, new(env.seed.cause_id, "  ", Decimal::ONE))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "number", .. }), "{err}");

    let err = env
        .services
        .invoices
        .submit(&vendor, new(env.seed.cause_id, "INV-6", Decimal::NEGATIVE_ONE))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "amount", .. }), "{err}");

    let err = env
        .services
        .invoices
        .submit(&vendor, new(env.seed.cause_id, "INV-6", Decimal::new(1_001, 3)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "amount", .. }), "{err}");

    let err = env
        .services
        .invoices
        .submit(&vendor, new(care.cause_id, "INV-6", Decimal::ONE))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "vendor_id", .. }), "{err}");

    let err = env
        .services
        .invoices
        .submit(&admin, new(env.seed.cause_id, "INV-6", Decimal::ONE))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)), "{err}");
}

#[tokio::test]
async fn test_receipt_approval_pays_the_ngo() {
    let env = TestEnv::new().await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let platform = env.ctx(Role::PlatformAdmin).await;

    let receipt = env
        .services
        .receipts
        .submit(
            &admin,
            NewNgoReceipt {
                cause_id: env.seed.cause_id,
                amount: Decimal::new(80_000, 2),
                note: Some("fuel for delivery trucks".to_owned()),
                files: vec![pdf("fuel.jpg", b"jpeg bytes")],
            },
        )
        .await
        .unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Submitted);
    assert_eq!(receipt.files.len(), 1);
    assert_eq!(receipt.note.as_deref(), Some("fuel for delivery trucks"));

    let err = env.services.receipts.approve(&admin, receipt.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)), "{err}");

    let outcome = env.services.receipts.approve(&platform, receipt.id).await.unwrap();
    assert_eq!(outcome.status, ReceiptStatus::AdminApproved);
    assert_eq!(outcome.payout.target, PayoutTarget::Ngo(env.hope()));
    assert_eq!(outcome.payout.source, PayoutSource::NgoReceipt(receipt.id));

    let err = env.services.receipts.approve(&platform, receipt.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)), "{err}");

    env.services
        .payouts
        .update_status(&platform, outcome.payout.id, processed("pout_ngo"))
        .await
        .unwrap();
    let paid = env.services.receipts.get(&admin, receipt.id).await.unwrap();
    assert_eq!(paid.status, ReceiptStatus::Paid);

    let queued = env
        .services
        .payouts
        .list(&admin, Some(PayoutStatus::Queued))
        .await
        .unwrap();
    assert!(queued.is_empty());
    let done = env
        .services
        .payouts
        .list(&admin, Some(PayoutStatus::Processed))
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
}

#[tokio::test]
async fn test_staff_cannot_submit_receipts() {
    let env = TestEnv::new().await;
    let staff = env.ctx(Role::NgoStaff).await;

    let err = env
        .services
        .receipts
        .submit(
            &staff,
            NewNgoReceipt {
                cause_id: env.seed.cause_id,
                amount: Decimal::ONE_HUNDRED,
                note: None,
                files: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)), "{err}");
}

#[tokio::test]
async fn test_payout_currency_follows_the_approved_document() {
    let env = TestEnv::new().await;
    let vendor = env.ctx(Role::Vendor).await;
    let admin = env.ctx(Role::NgoAdmin).await;
    let platform = env.ctx(Role::PlatformAdmin).await;
    let invoice = submit_invoice(&env, &vendor, "INV-FX").await;
    let receipt = env
        .services
        .receipts
        .submit(
            &admin,
            NewNgoReceipt {
                cause_id: env.seed.cause_id,
                amount: Decimal::new(4_200, 2),
                note: None,
                files: Vec::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.currency, "INR");
    assert_eq!(receipt.currency, "INR");

    // Default currency changed between submission and approval.
    let reconfigured = Services::new(
        env.db.clone(),
        Arc::new(TestModeGateway),
        DonationsConfig {
            default_currency: "USD".to_owned(),
            ..common::config()
        },
    );
    let vendor_payout = reconfigured.invoices.approve(&admin, invoice.id).await.unwrap().payout;
    let ngo_payout = reconfigured.receipts.approve(&platform, receipt.id).await.unwrap().payout;
    assert_eq!(vendor_payout.currency, "INR");
    assert_eq!(ngo_payout.currency, "INR");
}

#[tokio::test]
async fn test_receipt_amount_must_be_whole_paise() {
    let env = TestEnv::new().await;
    let admin = env.ctx(Role::NgoAdmin).await;

    let err = env
        .services
        .receipts
        .submit(
            &admin,
            NewNgoReceipt {
                cause_id: env.seed.cause_id,
                amount: Decimal::new(1, 3),
                note: None,
                files: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "amount", .. }), "{err}");
}
