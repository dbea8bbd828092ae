use crate::output::print_json;
use crate::root::Context;
use anyhow::Context as _;
use clap::Subcommand;
use kanban_core::{
    config::{Config, WarnLevel},
    paths,
};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective config and the resolved data directory
    Show,

    /// Validate config.yaml for common mistakes
    Validate,

    /// Write a default config.yaml if none exists
    Init,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Context, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let root = ctx.root()?;
    match subcmd {
        ConfigSubcommand::Show => show(&root, json),
        ConfigSubcommand::Validate => validate(&root, json),
        ConfigSubcommand::Init => init(&root, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let path = paths::config_path(root);

    if json {
        print_json(&serde_json::json!({
            "data_dir": root,
            "config_file": path,
            "config_file_exists": path.exists(),
            "config": config,
        }))?;
        return Ok(());
    }

    println!("Data dir:  {}", root.display());
    let note = if path.exists() { "" } else { " (not present, using defaults)" };
    println!("Config:    {}{note}", path.display());
    println!("Priority:  {}", config.default_priority);
    println!("Activity:  {} entries", config.activity_limit);
    println!("Swimlanes:");
    for lane in &config.default_swimlanes {
        let done = if lane.is_complete { " (complete)" } else { "" };
        println!("  {}{done}", lane.name);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(root: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    let created = !path.exists();
    if created {
        Config::default()
            .save(root)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        print_json(&serde_json::json!({ "config_file": path, "created": created }))?;
    } else if created {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists", path.display());
    }
    Ok(())
}
