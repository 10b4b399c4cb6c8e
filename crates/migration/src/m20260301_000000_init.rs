//! Initial schema migration - creates all tables from scratch.
//!
//! - `accounts`: users with their dual wallets and lifetime counters
//! - `products`: static investment product catalog
//! - `positions`: purchased product instances per account
//! - `transaction_records`: append-only audit trail
//! - `referrals`: referred first deposits awaiting admin review
//! - `referral_tiers`: static bonus configuration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    Phone,
    Password,
    ReferralCode,
    ReferredBy,
    DepositWalletMinor,
    WithdrawalWalletMinor,
    TotalDepositedMinor,
    TotalWithdrawnMinor,
    DailyIncomeRateMinor,
    LastAccrualAt,
    Blocked,
    IsAdmin,
    CreatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    PriceMinor,
    DailyYieldMinor,
    CycleDays,
    ResaleValueMinor,
    Retired,
}

#[derive(Iden)]
enum Positions {
    Table,
    Id,
    AccountId,
    ProductId,
    ProductName,
    DailyYieldMinor,
    CycleDays,
    PurchasedAt,
}

#[derive(Iden)]
enum TransactionRecords {
    Table,
    Id,
    AccountId,
    Kind,
    Status,
    AmountMinor,
    OccurredAt,
    Detail,
}

#[derive(Iden)]
enum Referrals {
    Table,
    Id,
    ReferrerAccountId,
    ReferredAccountId,
    FirstDepositMinor,
    Status,
    CreatedAt,
    DecidedAt,
}

#[derive(Iden)]
enum ReferralTiers {
    Table,
    MinReferrals,
    MaxReferrals,
    BonusPercent,
    Reward,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Phone)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::Password).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::ReferralCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::ReferredBy).string())
                    .col(
                        ColumnDef::new(Accounts::DepositWalletMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::WithdrawalWalletMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::TotalDepositedMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::TotalWithdrawnMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::DailyIncomeRateMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::LastAccrualAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Accounts::Blocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::PriceMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Products::DailyYieldMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::CycleDays).big_integer().not_null())
                    .col(
                        ColumnDef::new(Products::ResaleValueMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::Retired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Positions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Positions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Positions::AccountId).string().not_null())
                    .col(ColumnDef::new(Positions::ProductId).string().not_null())
                    .col(ColumnDef::new(Positions::ProductName).string().not_null())
                    .col(
                        ColumnDef::new(Positions::DailyYieldMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Positions::CycleDays).big_integer().not_null())
                    .col(
                        ColumnDef::new(Positions::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-positions-account_id")
                            .from(Positions::Table, Positions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-positions-product_id")
                            .from(Positions::Table, Positions::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionRecords::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionRecords::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionRecords::Kind).string().not_null())
                    .col(
                        ColumnDef::new(TransactionRecords::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionRecords::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionRecords::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionRecords::Detail).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_records-account_id")
                            .from(TransactionRecords::Table, TransactionRecords::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_records-account-occurred")
                    .table(TransactionRecords::Table)
                    .col(TransactionRecords::AccountId)
                    .col(TransactionRecords::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Referrals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferrerAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferredAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::FirstDepositMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Referrals::Status).string().not_null())
                    .col(
                        ColumnDef::new(Referrals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Referrals::DecidedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-referrals-referrer_account_id")
                            .from(Referrals::Table, Referrals::ReferrerAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReferralTiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReferralTiers::MinReferrals)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReferralTiers::MaxReferrals).big_integer())
                    .col(
                        ColumnDef::new(ReferralTiers::BonusPercent)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReferralTiers::Reward).string().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReferralTiers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Referrals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Positions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
