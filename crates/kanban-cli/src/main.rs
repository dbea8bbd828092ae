mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    activity::ActivitySubcommand, config::ConfigSubcommand, initiative::InitiativeSubcommand,
    project::ProjectSubcommand, swimlane::SwimlaneSubcommand, task::TaskSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kanban",
    about = "File-backed kanban board: projects, swimlanes, tasks, initiatives and activity",
    version,
    propagate_version = true
)]
struct Cli {
    /// Storage root (default: ~/.something-wicked/wicked-kanban)
    #[arg(long, global = true, env = "WICKED_KANBAN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print tables instead of JSON
    #[arg(long, global = true, short = 'H')]
    human: bool,

    /// Who is acting; recorded on activity entries and comments
    #[arg(long, global = true, env = "WICKED_KANBAN_ACTOR")]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Manage a project's swimlanes
    Swimlane {
        #[command(subcommand)]
        subcommand: SwimlaneSubcommand,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Manage initiatives
    Initiative {
        #[command(subcommand)]
        subcommand: InitiativeSubcommand,
    },

    /// Read the activity journal
    Activity {
        #[command(subcommand)]
        subcommand: ActivitySubcommand,
    },

    /// Show a project's board: lanes in order with their tasks
    Board { project: String },

    /// Full-text search over a project's tasks
    Search {
        project: String,
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Inspect and validate config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let json = !cli.human;
    let ctx = root::Context {
        data_dir: cli.data_dir,
        actor: cli.actor,
    };

    let result = match cli.command {
        Commands::Project { subcommand } => cmd::project::run(&ctx, subcommand, json),
        Commands::Swimlane { subcommand } => cmd::swimlane::run(&ctx, subcommand, json),
        Commands::Task { subcommand } => cmd::task::run(&ctx, subcommand, json),
        Commands::Initiative { subcommand } => cmd::initiative::run(&ctx, subcommand, json),
        Commands::Activity { subcommand } => cmd::activity::run(&ctx, subcommand, json),
        Commands::Board { project } => cmd::board::run(&ctx, &project, json),
        Commands::Search {
            project,
            query,
            limit,
        } => cmd::search::run(&ctx, &project, &query.join(" "), limit, json),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand, json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
