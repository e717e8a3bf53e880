use std::process;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use worktask::cli;
use worktask::cli::commands::{Cli, Commands};
use worktask::import::ImportRequest;

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("WORKTASK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn main() {
    let cli_args = Cli::parse();
    if let Err(e) = init_logging() {
        eprintln!("warning: {e:#}");
    }
    let ctx = cli::Context::from_cli(&cli_args);

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(&ctx),
        Commands::Task(cmd) => cli::task::run(cmd, &ctx),
        Commands::Checklist(cmd) => cli::checklist::run(cmd, &ctx),
        Commands::Dep(cmd) => cli::dep::run(cmd, &ctx),
        Commands::Dashboard => cli::dashboard::run(&ctx),
        Commands::Calendar { from, to } => cli::calendar::run(from, to, &ctx),
        Commands::Import {
            id,
            url,
            title,
            description,
            priority,
            assigned,
            due,
        } => {
            let request = ImportRequest {
                jira_id: id,
                jira_url: url,
                title,
                description,
                priority,
                assigned_date: assigned,
                due_date: due,
            };
            cli::import::run(request, &ctx)
        }
    };

    process::exit(exit_code);
}
