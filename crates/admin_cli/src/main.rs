use std::{error::Error, io::Write};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use ledger::Engine;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection, EntityTrait};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "nivesh_admin")]
#[command(about = "Admin utilities for Nivesh (bootstrap accounts, referral review)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./nivesh.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(AccountCli),
    Referral(ReferralCli),
}

#[derive(Args, Debug)]
struct AccountCli {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    Block(AccountFlagArgs),
    Unblock(AccountFlagArgs),
    List,
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    /// Referral code of an existing account, if this one was referred.
    #[arg(long)]
    referred_by: Option<String>,
    /// Grant access to the admin endpoints.
    #[arg(long)]
    admin: bool,
}

#[derive(Args, Debug)]
struct AccountFlagArgs {
    #[arg(long)]
    phone: String,
}

#[derive(Args, Debug)]
struct ReferralCli {
    #[command(subcommand)]
    command: ReferralCommand,
}

#[derive(Subcommand, Debug)]
enum ReferralCommand {
    /// Pending referrals awaiting a decision.
    List,
    Approve(ReferralDecideArgs),
    Reject(ReferralDecideArgs),
}

#[derive(Args, Debug)]
struct ReferralDecideArgs {
    #[arg(long)]
    id: Uuid,
}

/// Disables raw mode again when the prompt scope ends, including on error.
struct RawMode;

impl RawMode {
    fn on() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads a password from the terminal, echoing one `*` per character.
fn masked_prompt(label: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawMode::on()?;
    let mut tty = std::io::stderr();
    execute!(
        tty,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(label)
    )?;
    tty.flush()?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            execute!(tty, Print("\r\n"))?;
            return Err("interrupted".into());
        }
        match code {
            KeyCode::Enter => break,
            KeyCode::Backspace if !secret.is_empty() => {
                secret.pop();
                execute!(tty, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                secret.push(ch);
                execute!(tty, Print("*"))?;
            }
            _ => continue,
        }
        tty.flush()?;
    }
    execute!(tty, Print("\r\n"))?;
    tty.flush()?;
    Ok(secret)
}

fn prompt_new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    for attempt in 0..3 {
        if attempt > 0 {
            eprint!("Passwords did not match or were empty. Try again.\r\n");
        }
        let first = masked_prompt("Password: ")?;
        if first.is_empty() {
            continue;
        }
        if first == masked_prompt("Confirm password: ")? {
            return Ok(first);
        }
    }
    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn grant_admin(db: &DatabaseConnection, account_id: Uuid) -> Result<(), Box<dyn Error + Send + Sync>> {
    let model = ledger::account::Entity::find_by_id(account_id.to_string())
        .one(db)
        .await?
        .ok_or("account row vanished after registration")?;
    let mut active: ledger::account::ActiveModel = model.into();
    active.is_admin = ActiveValue::Set(true);
    active.update(db).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::Account(AccountCli {
            command: AccountCommand::Create(args),
        }) => {
            let password = prompt_new_password()?;
            let account = engine
                .register(
                    &args.name,
                    &args.phone,
                    &password,
                    args.referred_by.as_deref(),
                    Utc::now(),
                )
                .await?;
            if args.admin {
                grant_admin(&db, account.id).await?;
            }
            println!(
                "created account: {} ({}) referral code {}",
                account.name, account.id, account.referral_code
            );
        }
        Command::Account(AccountCli {
            command: AccountCommand::Block(args),
        }) => {
            let account = engine.account_by_phone(&args.phone).await?;
            engine.set_blocked(account.id, true).await?;
            println!("blocked account: {} ({})", account.name, account.id);
        }
        Command::Account(AccountCli {
            command: AccountCommand::Unblock(args),
        }) => {
            let account = engine.account_by_phone(&args.phone).await?;
            engine.set_blocked(account.id, false).await?;
            println!("unblocked account: {} ({})", account.name, account.id);
        }
        Command::Account(AccountCli {
            command: AccountCommand::List,
        }) => {
            for (account, is_admin) in engine.list_accounts().await? {
                println!(
                    "{}  {}  phone {}  deposit {}  withdrawal {}  positions {}{}{}",
                    account.id,
                    account.name,
                    account.phone,
                    account.deposit_wallet,
                    account.withdrawal_wallet,
                    account.positions.len(),
                    if account.blocked { "  [blocked]" } else { "" },
                    if is_admin { "  [admin]" } else { "" },
                );
            }
        }
        Command::Referral(ReferralCli {
            command: ReferralCommand::List,
        }) => {
            let pending = engine.pending_referrals().await?;
            if pending.is_empty() {
                println!("no pending referrals");
            }
            for referral in pending {
                println!(
                    "{}  referrer {}  referred {}  first deposit {}  since {}",
                    referral.id,
                    referral.referrer_account_id,
                    referral.referred_account_id,
                    referral.first_deposit,
                    referral.created_at.format("%Y-%m-%d"),
                );
            }
        }
        Command::Referral(ReferralCli {
            command: ReferralCommand::Approve(args),
        }) => {
            let transition = engine.approve_referral(args.id, Utc::now()).await?;
            println!(
                "approved referral {}; credited {}, withdrawal wallet now {}",
                args.id,
                transition
                    .record
                    .as_ref()
                    .map(|r| r.amount.to_string())
                    .unwrap_or_default(),
                transition.account.withdrawal_wallet,
            );
        }
        Command::Referral(ReferralCli {
            command: ReferralCommand::Reject(args),
        }) => {
            engine.reject_referral(args.id, Utc::now()).await?;
            println!("rejected referral {}", args.id);
        }
    }

    Ok(())
}
