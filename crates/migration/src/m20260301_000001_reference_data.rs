//! Seeds the static reference data: referral tiers and the starter product
//! catalog. Both tables are plain configuration rows the engine reads at
//! run time; seeding them here keeps a fresh database usable out of the box.

use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

// (name, price, daily yield, cycle days, resale value) in minor units.
const PRODUCTS: &[(&str, i64, i64, i64, i64)] = &[
    ("Starter Plan", 50000, 1500, 30, 20000),
    ("Solar Fund A", 60000, 2000, 45, 30000),
    ("Wind Plan B", 150000, 5500, 45, 75000),
    ("Infra Bond C", 500000, 20000, 60, 250000),
];

// (min, max or NULL, bonus percent, reward description).
const TIERS: &[(i64, Option<i64>, i64, &str)] = &[
    (1, Some(5), 10, "10% of first deposit"),
    (6, Some(15), 15, "15% of first deposit"),
    (16, Some(30), 20, "20% of first deposit"),
    (31, None, 25, "25% of first deposit"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (name, price, daily_yield, cycle_days, resale) in PRODUCTS {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO products (id, name, price_minor, daily_yield_minor, cycle_days, resale_value_minor, retired) \
                 VALUES (?, ?, ?, ?, ?, ?, FALSE)",
                vec![
                    Uuid::new_v4().to_string().into(),
                    (*name).into(),
                    (*price).into(),
                    (*daily_yield).into(),
                    (*cycle_days).into(),
                    (*resale).into(),
                ],
            ))
            .await?;
        }

        for (min, max, bonus, reward) in TIERS {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO referral_tiers (min_referrals, max_referrals, bonus_percent, reward) \
                 VALUES (?, ?, ?, ?)",
                vec![(*min).into(), (*max).into(), (*bonus).into(), (*reward).into()],
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        db.execute(Statement::from_string(
            backend,
            "DELETE FROM referral_tiers".to_string(),
        ))
        .await?;
        db.execute(Statement::from_string(
            backend,
            "DELETE FROM products".to_string(),
        ))
        .await?;
        Ok(())
    }
}
