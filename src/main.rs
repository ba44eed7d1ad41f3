use clap::Parser;
use home_budget::args::{Args, CategoryCommand, Command, ExpenseCommand};
use home_budget::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.force()).await?.print(),

        Command::Category(category_args) => {
            let config = Config::load(home).await?;
            match category_args.command() {
                CategoryCommand::List(list) => commands::category_list(&config, list.format())
                    .await?
                    .print_rows(),
                CategoryCommand::Add(fields) => {
                    commands::category_add(&config, fields.description(), fields.category_type())
                        .await?
                        .print()
                }
                CategoryCommand::Update(update) => commands::category_update(
                    &config,
                    update.id(),
                    update.fields().description(),
                    update.fields().category_type(),
                )
                .await?
                .print(),
                CategoryCommand::Delete(id) => {
                    commands::category_delete(&config, id.id()).await?.print()
                }
                CategoryCommand::Reset => commands::category_reset(&config).await?.print(),
            }
        }

        Command::Expense(expense_args) => {
            let config = Config::load(home).await?;
            match expense_args.command() {
                ExpenseCommand::List(list) => commands::expense_list(&config, list.format())
                    .await?
                    .print_rows(),
                ExpenseCommand::Add(fields) => {
                    commands::expense_add(&config, fields).await?.print()
                }
                ExpenseCommand::Update(update) => {
                    commands::expense_update(&config, update.id(), update.fields())
                        .await?
                        .print()
                }
                ExpenseCommand::Delete(id) => {
                    commands::expense_delete(&config, id.id()).await?.print()
                }
            }
        }

        Command::Report(report_args) => {
            let config = Config::load(home).await?;
            commands::report(&config, report_args).await?.print_rows()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
