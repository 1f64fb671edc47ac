//! Demo dataset for local development.

use donations_sdk::{CauseStatus, CauseType, DomainStatus, KycStatus};
use marketplace_security::Role;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::entity::{category, cause, membership, tenant, tenant_domain, tenant_policy, user, vendor, vendor_link};
use crate::domain::error::DomainError;

/// Login is handled elsewhere; seeded users cannot sign in with a password.
const PLACEHOLDER_PASSWORD_HASH: &str = "!";

/// Ids of the seeded rows.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub users: Vec<SeededUser>,
    pub tenants: Vec<(String, Uuid)>,
    pub vendor_id: Uuid,
    pub cause_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct SeededUser {
    pub email: &'static str,
    pub role: Role,
    pub id: Uuid,
}

struct DemoUser {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    phone: &'static str,
    role: Role,
}

const DEMO_USERS: [DemoUser; 5] = [
    DemoUser { email: "admin@example.com", first_name: "Platform", last_name: "Admin", phone: "+1234567890", role: Role::PlatformAdmin },
    DemoUser { email: "ngo.hope.admin@example.com", first_name: "Hope", last_name: "Admin", phone: "+1234567891", role: Role::NgoAdmin },
    DemoUser { email: "ngo.hope.staff@example.com", first_name: "Hope", last_name: "Staff", phone: "+1234567892", role: Role::NgoStaff },
    DemoUser { email: "vendor.alpha@example.com", first_name: "Alpha", last_name: "Supplies", phone: "+1234567893", role: Role::Vendor },
    DemoUser { email: "donor.arya@example.com", first_name: "Arya", last_name: "Donor", phone: "+1234567894", role: Role::Donor },
];

struct DemoTenant {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    website_url: &'static str,
    contact_email: &'static str,
    contact_phone: &'static str,
    address: &'static str,
    host: &'static str,
}

const DEMO_TENANTS: [DemoTenant; 2] = [
    DemoTenant {
        name: "Hope Trust",
        slug: "hope-trust",
        description: "Providing hope and support to communities in need",
        website_url: "https://hopetrust.org",
        contact_email: "contact@hopetrust.org",
        contact_phone: "+1-555-HOPE",
        address: "123 Hope Street, Hope City, HC 12345",
        host: "hopetrust.local",
    },
    DemoTenant {
        name: "Care Works",
        slug: "care-works",
        description: "Caring for the community through various initiatives",
        website_url: "https://careworks.org",
        contact_email: "contact@careworks.org",
        contact_phone: "+1-555-CARE",
        address: "456 Care Avenue, Care City, CC 67890",
        host: "careworks.local",
    },
];

const DEMO_CATEGORIES: [(&str, &str); 3] = [
    ("Food", "Food and nutrition related causes"),
    ("Health", "Healthcare and medical causes"),
    ("Education", "Educational and learning causes"),
];

/// Insert the demo dataset in one transaction.
///
/// # Errors
/// `Conflict` when the demo tenants already exist.
pub async fn seed_demo(db: &DatabaseConnection, external_base_url: &str) -> Result<SeedReport, DomainError> {
    let txn = db.begin().await?;
    let present = tenant::Entity::find()
        .filter(tenant::Column::Slug.eq(DEMO_TENANTS[0].slug))
        .count(&txn)
        .await?;
    if present > 0 {
        return Err(DomainError::conflict("demo data is already present"));
    }

    let ts = OffsetDateTime::now_utc();
    let base = external_base_url.trim_end_matches('/');

    let mut category_ids = Vec::with_capacity(DEMO_CATEGORIES.len());
    for (name, description) in DEMO_CATEGORIES {
        let row = category::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_owned()),
            description: Set(Some(description.to_owned())),
            created_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        category_ids.push(row.id);
    }

    let mut users = Vec::with_capacity(DEMO_USERS.len());
    for demo in &DEMO_USERS {
        let row = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(demo.email.to_owned()),
            password_hash: Set(PLACEHOLDER_PASSWORD_HASH.to_owned()),
            first_name: Set(Some(demo.first_name.to_owned())),
            last_name: Set(Some(demo.last_name.to_owned())),
            phone: Set(Some(demo.phone.to_owned())),
            is_active: Set(true),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        users.push(SeededUser {
            email: demo.email,
            role: demo.role,
            id: row.id,
        });
    }

    let mut tenants = Vec::with_capacity(DEMO_TENANTS.len());
    for demo in &DEMO_TENANTS {
        let row = tenant::ActiveModel {
            id: Set(Uuid::now_v7()),
            slug: Set(demo.slug.to_owned()),
            name: Set(demo.name.to_owned()),
            description: Set(Some(demo.description.to_owned())),
            logo_url: Set(Some(format!("{base}/logos/{}.png", demo.slug))),
            website_url: Set(Some(demo.website_url.to_owned())),
            contact_email: Set(Some(demo.contact_email.to_owned())),
            contact_phone: Set(Some(demo.contact_phone.to_owned())),
            address: Set(Some(demo.address.to_owned())),
            primary_color: Set(None),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        tenant_domain::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(row.id),
            host: Set(demo.host.to_owned()),
            status: Set(DomainStatus::Live.as_str().to_owned()),
            is_primary: Set(true),
            created_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        tenant_policy::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(row.id),
            allow_ngo_managed: Set(false),
            ngo_managed_monthly_cap_percent: Set(10),
            created_at: Set(ts),
            updated_at: Set(ts),
        }
        .insert(&txn)
        .await?;
        tenants.push((demo.slug.to_owned(), row.id));
    }
    let hope = tenants[0].1;
    let care = tenants[1].1;

    let vendor = vendor::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(hope),
        name: Set("Alpha Supplies".to_owned()),
        gstin: Set(Some("29ABCDE1234F1Z5".to_owned())),
        bank_json: Set(Some(json!({
            "account_number": "1234567890",
            "ifsc_code": "HDFC0001234",
            "account_holder": "Alpha Supplies",
        }))),
        kyc_status: Set(KycStatus::Verified.as_str().to_owned()),
        created_at: Set(ts),
        updated_at: Set(ts),
    }
    .insert(&txn)
    .await?;

    for seeded in &users {
        let vendor_id = (seeded.role == Role::Vendor).then_some(vendor.id);
        insert_membership(&txn, seeded.id, hope, seeded.role, vendor_id, ts).await?;
        if seeded.role == Role::Donor {
            insert_membership(&txn, seeded.id, care, Role::Donor, None, ts).await?;
        }
    }

    let cause = cause::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(hope),
        category_id: Set(category_ids[0]),
        title: Set("Emergency Food Relief".to_owned()),
        description: Set(Some(
            "Providing emergency food supplies to families affected by natural disasters".to_owned(),
        )),
        goal_amount: Set(Decimal::new(5_000_000, 2)),
        raised_amount: Set(Decimal::new(0, 2)),
        cause_type: Set(CauseType::Vendor.as_str().to_owned()),
        status: Set(CauseStatus::Live.as_str().to_owned()),
        policy_flags: Set(Some(json!({ "requires_approval": true, "max_amount_per_donation": 10000 }))),
        created_at: Set(ts),
        updated_at: Set(ts),
    }
    .insert(&txn)
    .await?;

    vendor_link::ActiveModel {
        id: Set(Uuid::now_v7()),
        cause_id: Set(cause.id),
        vendor_id: Set(vendor.id),
        terms_json: Set(Some(json!({
            "delivery_time": "7 days",
            "warranty": "1 year",
            "payment_terms": "Net 30",
        }))),
        created_at: Set(ts),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    tracing::info!(cause_id = %cause.id, vendor_id = %vendor.id, "demo data seeded");

    Ok(SeedReport {
        users,
        tenants,
        vendor_id: vendor.id,
        cause_id: cause.id,
    })
}

async fn insert_membership<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    tenant_id: Uuid,
    role: Role,
    vendor_id: Option<Uuid>,
    ts: OffsetDateTime,
) -> Result<(), DomainError> {
    membership::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        tenant_id: Set(tenant_id),
        role: Set(role.as_str().to_owned()),
        vendor_id: Set(vendor_id),
        created_at: Set(ts),
    }
    .insert(conn)
    .await?;
    Ok(())
}
