use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn money_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).decimal_len(15, 2).not_null().to_owned()
}

fn ts_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).timestamp_with_time_zone().not_null().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(id_col(Tenants::Id))
                    .col(ColumnDef::new(Tenants::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Name).string().not_null())
                    .col(ColumnDef::new(Tenants::Description).text())
                    .col(ColumnDef::new(Tenants::LogoUrl).string())
                    .col(ColumnDef::new(Tenants::WebsiteUrl).string())
                    .col(ColumnDef::new(Tenants::ContactEmail).string())
                    .col(ColumnDef::new(Tenants::ContactPhone).string())
                    .col(ColumnDef::new(Tenants::Address).text())
                    .col(ColumnDef::new(Tenants::PrimaryColor).string())
                    .col(ts_col(Tenants::CreatedAt))
                    .col(ts_col(Tenants::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TenantDomains::Table)
                    .if_not_exists()
                    .col(id_col(TenantDomains::Id))
                    .col(ColumnDef::new(TenantDomains::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TenantDomains::Host).string().not_null())
                    .col(ColumnDef::new(TenantDomains::Status).string().not_null())
                    .col(ColumnDef::new(TenantDomains::IsPrimary).boolean().not_null().default(false))
                    .col(ts_col(TenantDomains::CreatedAt))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_tenant_domains_host")
                    .table(TenantDomains::Table)
                    .col(TenantDomains::Host)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TenantPolicies::Table)
                    .if_not_exists()
                    .col(id_col(TenantPolicies::Id))
                    .col(ColumnDef::new(TenantPolicies::TenantId).uuid().not_null().unique_key())
                    .col(
                        ColumnDef::new(TenantPolicies::AllowNgoManaged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TenantPolicies::NgoManagedMonthlyCapPercent)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(ts_col(TenantPolicies::CreatedAt))
                    .col(ts_col(TenantPolicies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string())
                    .col(ColumnDef::new(Users::LastName).string())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ts_col(Users::CreatedAt))
                    .col(ts_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(id_col(Memberships::Id))
                    .col(ColumnDef::new(Memberships::UserId).uuid().not_null())
                    .col(ColumnDef::new(Memberships::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Memberships::Role).string().not_null())
                    .col(ColumnDef::new(Memberships::VendorId).uuid())
                    .col(ts_col(Memberships::CreatedAt))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_memberships_user")
                    .table(Memberships::Table)
                    .col(Memberships::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(id_col(Categories::Id))
                    .col(ColumnDef::new(Categories::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Categories::Description).text())
                    .col(ts_col(Categories::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Causes::Table)
                    .if_not_exists()
                    .col(id_col(Causes::Id))
                    .col(ColumnDef::new(Causes::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Causes::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Causes::Title).string().not_null())
                    .col(ColumnDef::new(Causes::Description).text())
                    .col(money_col(Causes::GoalAmount))
                    .col(money_col(Causes::RaisedAmount).default(0))
                    .col(ColumnDef::new(Causes::CauseType).string().not_null())
                    .col(ColumnDef::new(Causes::Status).string().not_null())
                    .col(ColumnDef::new(Causes::PolicyFlags).json())
                    .col(ts_col(Causes::CreatedAt))
                    .col(ts_col(Causes::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Donations::Table)
                    .if_not_exists()
                    .col(id_col(Donations::Id))
                    .col(ColumnDef::new(Donations::CauseId).uuid().not_null())
                    .col(ColumnDef::new(Donations::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Donations::DonorUserId).uuid().not_null())
                    .col(money_col(Donations::Amount))
                    .col(ColumnDef::new(Donations::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Donations::PgOrderId).string())
                    .col(ColumnDef::new(Donations::PgPaymentId).string())
                    .col(ColumnDef::new(Donations::PgSignature).string())
                    .col(ColumnDef::new(Donations::Status).string().not_null())
                    .col(ColumnDef::new(Donations::AuditJson).json())
                    .col(ts_col(Donations::CreatedAt))
                    .col(ts_col(Donations::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_donations_pg_order_id")
                    .table(Donations::Table)
                    .col(Donations::PgOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(id_col(Vendors::Id))
                    .col(ColumnDef::new(Vendors::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Vendors::Name).string().not_null())
                    .col(ColumnDef::new(Vendors::Gstin).string())
                    .col(ColumnDef::new(Vendors::BankJson).json())
                    .col(ColumnDef::new(Vendors::KycStatus).string().not_null())
                    .col(ts_col(Vendors::CreatedAt))
                    .col(ts_col(Vendors::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VendorLinks::Table)
                    .if_not_exists()
                    .col(id_col(VendorLinks::Id))
                    .col(ColumnDef::new(VendorLinks::CauseId).uuid().not_null())
                    .col(ColumnDef::new(VendorLinks::VendorId).uuid().not_null())
                    .col(ColumnDef::new(VendorLinks::TermsJson).json())
                    .col(ts_col(VendorLinks::CreatedAt))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uq_vendor_links_cause_vendor")
                    .table(VendorLinks::Table)
                    .col(VendorLinks::CauseId)
                    .col(VendorLinks::VendorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VendorInvoices::Table)
                    .if_not_exists()
                    .col(id_col(VendorInvoices::Id))
                    .col(ColumnDef::new(VendorInvoices::CauseId).uuid().not_null())
                    .col(ColumnDef::new(VendorInvoices::VendorId).uuid().not_null())
                    .col(ColumnDef::new(VendorInvoices::TenantId).uuid().not_null())
                    .col(ColumnDef::new(VendorInvoices::Number).string().not_null())
                    .col(money_col(VendorInvoices::Amount))
                    .col(ColumnDef::new(VendorInvoices::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(VendorInvoices::Files).json().not_null())
                    .col(ColumnDef::new(VendorInvoices::Status).string().not_null())
                    .col(ts_col(VendorInvoices::CreatedAt))
                    .col(ts_col(VendorInvoices::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NgoReceipts::Table)
                    .if_not_exists()
                    .col(id_col(NgoReceipts::Id))
                    .col(ColumnDef::new(NgoReceipts::CauseId).uuid().not_null())
                    .col(ColumnDef::new(NgoReceipts::TenantId).uuid().not_null())
                    .col(money_col(NgoReceipts::Amount))
                    .col(ColumnDef::new(NgoReceipts::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(NgoReceipts::Files).json().not_null())
                    .col(ColumnDef::new(NgoReceipts::Note).text())
                    .col(ColumnDef::new(NgoReceipts::Status).string().not_null())
                    .col(ts_col(NgoReceipts::CreatedAt))
                    .col(ts_col(NgoReceipts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payouts::Table)
                    .if_not_exists()
                    .col(id_col(Payouts::Id))
                    .col(ColumnDef::new(Payouts::ToType).string().not_null())
                    .col(ColumnDef::new(Payouts::ToId).uuid().not_null())
                    .col(ColumnDef::new(Payouts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Payouts::SourceType).string().not_null())
                    .col(ColumnDef::new(Payouts::SourceId).uuid().not_null())
                    .col(money_col(Payouts::Amount))
                    .col(ColumnDef::new(Payouts::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Payouts::PgPayoutId).string())
                    .col(ColumnDef::new(Payouts::Status).string().not_null())
                    .col(ts_col(Payouts::CreatedAt))
                    .col(ts_col(Payouts::UpdatedAt))
                    .to_owned(),
            )
            .await?;
        // One payout per approval event.
        manager
            .create_index(
                Index::create()
                    .name("uq_payouts_source")
                    .table(Payouts::Table)
                    .col(Payouts::SourceType)
                    .col(Payouts::SourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(id_col(Documents::Id))
                    .col(ColumnDef::new(Documents::Url).string().not_null())
                    .col(ColumnDef::new(Documents::Filename).string().not_null())
                    .col(ColumnDef::new(Documents::HashSha256).string_len(64).not_null())
                    .col(ColumnDef::new(Documents::UploadedBy).uuid().not_null())
                    .col(ColumnDef::new(Documents::Purpose).string().not_null())
                    .col(ColumnDef::new(Documents::SignedBy).uuid())
                    .col(ColumnDef::new(Documents::SignedAt).timestamp_with_time_zone())
                    .col(ts_col(Documents::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(id_col(AuditLogs::Id))
                    .col(ColumnDef::new(AuditLogs::ActorId).uuid())
                    .col(ColumnDef::new(AuditLogs::Entity).string().not_null())
                    .col(ColumnDef::new(AuditLogs::EntityId).uuid().not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::BeforeJson).json())
                    .col(ColumnDef::new(AuditLogs::AfterJson).json())
                    .col(ts_col(AuditLogs::Ts))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_entity")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Entity)
                    .col(AuditLogs::EntityId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            AuditLogs::Table.into_iden(),
            Documents::Table.into_iden(),
            Payouts::Table.into_iden(),
            NgoReceipts::Table.into_iden(),
            VendorInvoices::Table.into_iden(),
            VendorLinks::Table.into_iden(),
            Vendors::Table.into_iden(),
            Donations::Table.into_iden(),
            Causes::Table.into_iden(),
            Categories::Table.into_iden(),
            Memberships::Table.into_iden(),
            Users::Table.into_iden(),
            TenantPolicies::Table.into_iden(),
            TenantDomains::Table.into_iden(),
            Tenants::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
    Slug,
    Name,
    Description,
    LogoUrl,
    WebsiteUrl,
    ContactEmail,
    ContactPhone,
    Address,
    PrimaryColor,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TenantDomains {
    Table,
    Id,
    TenantId,
    Host,
    Status,
    IsPrimary,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TenantPolicies {
    Table,
    Id,
    TenantId,
    AllowNgoManaged,
    NgoManagedMonthlyCapPercent,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Phone,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Memberships {
    Table,
    Id,
    UserId,
    TenantId,
    Role,
    VendorId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Causes {
    Table,
    Id,
    TenantId,
    CategoryId,
    Title,
    Description,
    GoalAmount,
    RaisedAmount,
    CauseType,
    Status,
    PolicyFlags,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Donations {
    Table,
    Id,
    CauseId,
    TenantId,
    DonorUserId,
    Amount,
    Currency,
    PgOrderId,
    PgPaymentId,
    PgSignature,
    Status,
    AuditJson,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    TenantId,
    Name,
    Gstin,
    BankJson,
    KycStatus,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VendorLinks {
    Table,
    Id,
    CauseId,
    VendorId,
    TermsJson,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VendorInvoices {
    Table,
    Id,
    CauseId,
    VendorId,
    TenantId,
    Number,
    Amount,
    Currency,
    Files,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NgoReceipts {
    Table,
    Id,
    CauseId,
    TenantId,
    Amount,
    Currency,
    Files,
    Note,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payouts {
    Table,
    Id,
    ToType,
    ToId,
    TenantId,
    SourceType,
    SourceId,
    Amount,
    Currency,
    PgPayoutId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    Url,
    Filename,
    HashSha256,
    UploadedBy,
    Purpose,
    SignedBy,
    SignedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    ActorId,
    Entity,
    EntityId,
    Action,
    BeforeJson,
    AfterJson,
    Ts,
}
