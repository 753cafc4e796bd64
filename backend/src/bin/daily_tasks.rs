//! Once-a-day job runner for streak resets, task assignment, and reminders.
//!
//! An external scheduler invokes one subcommand per run. Batch subcommands
//! print their report as JSON and exit non-zero when any user failed, so the
//! scheduler notices and the next run retries.

use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig as _;
use serde_json::json;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use petcare_backend::config::DailyTaskSettings;
use petcare_backend::domain::{
    BatchReport, DailyTaskScheduler, DailyTaskSchedulerPorts, PushNotificationDispatcher,
    SingleAssignmentOutcome, UserId,
};
use petcare_backend::outbound::persistence::{
    DbPool, DieselDailyTaskStore, DieselDeviceTokenStore, DieselUserStore, PoolConfig,
    run_pending_migrations,
};
use petcare_backend::outbound::push::ExpoHttpGateway;

#[derive(Debug, Parser)]
#[command(name = "daily-tasks", about = "Daily task streak and reminder jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reset lapsed streaks, then assign today's tasks.
    Run,
    /// Reset streaks of users who missed their previous task.
    Reset,
    /// Assign today's task to every user.
    Assign,
    /// Assign today's task to one user with a first-task streak.
    AssignUser {
        #[arg(long)]
        user_id: Uuid,
    },
    /// Show one user's assignment for today.
    Current {
        #[arg(long)]
        user_id: Uuid,
    },
    /// Send the daily reminder to every registered device.
    Notify,
    /// Apply pending schema migrations.
    Migrate,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = DailyTaskSettings::load_from_iter([OsString::from("daily-tasks")])
        .map_err(|error| eyre!("failed to load settings: {error}"))?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build daily task runtime")?;
    runtime.block_on(execute(cli.command, settings))
}

async fn execute(command: Command, settings: DailyTaskSettings) -> Result<ExitCode> {
    let database_url = settings.database_url()?;

    if matches!(command, Command::Migrate) {
        let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&database_url))
            .await
            .wrap_err("migration task panicked")??;
        info!(count = applied.len(), versions = ?applied, "migrations applied");
        return Ok(ExitCode::SUCCESS);
    }

    let pool = DbPool::new(PoolConfig::for_batch(
        database_url,
        settings.max_concurrent_users(),
    ))
    .await
    .wrap_err("failed to connect to database")?;

    match command {
        Command::Notify => notify(&settings, pool).await,
        command => schedule(command, &settings, pool).await,
    }
}

async fn schedule(command: Command, settings: &DailyTaskSettings, pool: DbPool) -> Result<ExitCode> {
    let ports = DailyTaskSchedulerPorts::new(
        Arc::new(DieselUserStore::with_page_size(
            pool.clone(),
            settings.user_page_size(),
        )),
        Arc::new(DieselDailyTaskStore::new(pool)),
    );
    let scheduler = DailyTaskScheduler::new(
        ports,
        Arc::new(DefaultClock),
        settings.scheduler_config()?,
    );

    match command {
        Command::Run => {
            let run = scheduler.run_daily().await;
            print_report(&run.reset);
            print_report(&run.assignment);
            Ok(exit_code(run.is_clean()))
        }
        Command::Reset => {
            let report = scheduler.reset_lapsed_streaks().await;
            print_report(&report);
            Ok(exit_code(report.is_clean()))
        }
        Command::Assign => {
            let report = scheduler.assign_new_tasks().await;
            print_report(&report);
            Ok(exit_code(report.is_clean()))
        }
        Command::AssignUser { user_id } => {
            let outcome = scheduler
                .create_single_assignment(UserId::from_uuid(user_id))
                .await?;
            let summary = match outcome {
                SingleAssignmentOutcome::Created {
                    assignment_id,
                    streak,
                } => json!({ "created": true, "assignmentId": assignment_id, "streak": streak }),
                SingleAssignmentOutcome::AlreadyAssigned => json!({ "created": false }),
            };
            println!("{summary}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Current { user_id } => {
            let current = scheduler
                .current_assignment(UserId::from_uuid(user_id))
                .await?;
            let summary = match current {
                Some(found) => json!({
                    "assignment": found.assignment,
                    "completed": found.is_completed(),
                    "streak": found.owner_streak,
                }),
                None => json!({ "assignment": null }),
            };
            println!("{summary}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Notify | Command::Migrate => Err(eyre!("not a scheduler command")),
    }
}

async fn notify(settings: &DailyTaskSettings, pool: DbPool) -> Result<ExitCode> {
    let gateway = ExpoHttpGateway::new(settings.push_endpoint()?, settings.push_timeout())
        .wrap_err("failed to build push client")?;
    let dispatcher = PushNotificationDispatcher::new(
        Arc::new(DieselDeviceTokenStore::new(pool)),
        Arc::new(gateway),
        settings.reminder_content(),
    );

    let report = dispatcher.dispatch().await?;
    println!(
        "{}",
        json!({ "messages": report.message_count, "status": report.gateway_status })
    );
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &BatchReport) {
    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|failure| json!({ "userId": failure.user_id, "error": failure.error.to_string() }))
        .collect();
    let summary = json!({
        "pass": report.pass.as_str(),
        "serviceDay": report.service_day,
        "visited": report.visited(),
        "updated": report.updated,
        "unchanged": report.unchanged,
        "alreadyAssigned": report.already_assigned,
        "failures": failures,
        "listingFailure": report.listing_failure.as_ref().map(ToString::to_string),
    });
    println!("{summary}");
}

fn exit_code(clean: bool) -> ExitCode {
    if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
