use std::str::FromStr;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "nivesh={level},server={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let accrual_policy = parse_accrual_policy(settings.accrual.as_ref())?;
    let sweep_interval = Duration::from_secs(
        settings
            .accrual
            .as_ref()
            .and_then(|a| a.sweep_interval_minutes)
            .unwrap_or(60)
            * 60,
    );

    let db = parse_database(&settings.server.database).await?;

    {
        let db = db.clone();
        let server_settings = settings.server;
        tasks.spawn(async move {
            let engine = match ledger::Engine::builder().database(db.clone()).build().await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            let bind = server_settings.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server_settings.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, db, accrual_policy, listener).await
            {
                tracing::error!("server failed: {err}");
            }
        });
    }

    {
        let db = db.clone();
        tasks.spawn(async move {
            let engine = match ledger::Engine::builder().database(db).build().await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine for accrual sweep: {err}");
                    return;
                }
            };

            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                match engine.accrue_all(&accrual_policy, chrono::Utc::now()).await {
                    Ok(credited) if credited > 0 => {
                        tracing::info!(credited, "accrual sweep credited accounts");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!("accrual sweep failed: {err}"),
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

fn parse_accrual_policy(
    accrual: Option<&settings::Accrual>,
) -> Result<ledger::AccrualPolicy, Box<dyn std::error::Error + Send + Sync>> {
    let mut policy = ledger::AccrualPolicy::default();
    if let Some(accrual) = accrual {
        if let Some(tz) = &accrual.timezone {
            policy.timezone = chrono_tz::Tz::from_str(tz)
                .map_err(|err| format!("invalid accrual timezone {tz}: {err}"))?;
        }
        policy.earliest_hour = accrual.earliest_hour;
    }
    Ok(policy)
}
