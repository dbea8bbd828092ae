use crate::output::{opt, print_json, print_table};
use crate::root::Context;
use anyhow::Context as _;
use clap::Subcommand;
use kanban_core::store::{NewProject, ProjectUpdate};

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Create a project with the configured default swimlanes
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Path of the repository this project tracks
        #[arg(long)]
        repo_path: Option<String>,
    },
    /// List projects
    List {
        /// Include archived projects
        #[arg(long)]
        all: bool,
    },
    /// Show one project
    Show { id: String },
    /// Update project fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_repo_path")]
        repo_path: Option<String>,
        /// Remove the repository path
        #[arg(long)]
        clear_repo_path: bool,
    },
    /// Hide a project from the default listing
    Archive { id: String },
    /// Restore an archived project
    Unarchive { id: String },
    /// Delete a project and everything in it
    Delete { id: String },
    /// Task counts per lane and priority, blocked count, completion
    Stats { id: String },
    /// Report dangling dependencies, unknown lanes and index drift
    Check { id: String },
    /// Rebuild tasks/index.json from the task files
    Reindex { id: String },
}

pub fn run(ctx: &Context, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Create {
            name,
            description,
            repo_path,
        } => create(ctx, name, description, repo_path, json),
        ProjectSubcommand::List { all } => list(ctx, all, json),
        ProjectSubcommand::Show { id } => show(ctx, &id, json),
        ProjectSubcommand::Update {
            id,
            name,
            description,
            repo_path,
            clear_repo_path,
        } => {
            let repo_path = if clear_repo_path {
                Some(None)
            } else {
                repo_path.map(Some)
            };
            let changes = ProjectUpdate {
                name,
                description,
                repo_path,
            };
            update(ctx, &id, changes, json)
        }
        ProjectSubcommand::Archive { id } => archive(ctx, &id, true, json),
        ProjectSubcommand::Unarchive { id } => archive(ctx, &id, false, json),
        ProjectSubcommand::Delete { id } => delete(ctx, &id, json),
        ProjectSubcommand::Stats { id } => stats(ctx, &id, json),
        ProjectSubcommand::Check { id } => check(ctx, &id, json),
        ProjectSubcommand::Reindex { id } => reindex(ctx, &id, json),
    }
}

fn create(
    ctx: &Context,
    name: String,
    description: String,
    repo_path: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let project = store
        .create_project(NewProject {
            name,
            description,
            repo_path,
        })
        .context("failed to create project")?;

    if json {
        print_json(&project)?;
    } else {
        println!("Created project [{}]: {}", project.id, project.name);
    }
    Ok(())
}

fn list(ctx: &Context, all: bool, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let projects = store.list_projects(all).context("failed to list projects")?;

    if json {
        print_json(&projects)?;
        return Ok(());
    }

    let rows = projects
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.name.clone(),
                if p.archived { "archived" } else { "active" }.to_string(),
                opt(p.repo_path.as_deref()),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STATE", "REPO"], rows);
    Ok(())
}

fn show(ctx: &Context, id: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let project = store
        .get_project(id)?
        .with_context(|| format!("project '{id}' not found"))?;

    if json {
        print_json(&project)?;
        return Ok(());
    }

    println!("Project:     {} [{}]", project.name, project.id);
    if !project.description.is_empty() {
        println!("Description: {}", project.description);
    }
    println!("Repo:        {}", opt(project.repo_path.as_deref()));
    println!("Archived:    {}", project.archived);
    println!("Created:     {}", project.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated:     {}", project.updated_at.format("%Y-%m-%d %H:%M"));
    Ok(())
}

fn update(ctx: &Context, id: &str, update: ProjectUpdate, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let project = store
        .update_project(id, update)
        .with_context(|| format!("failed to update project '{id}'"))?;

    if json {
        print_json(&project)?;
    } else {
        println!("Updated project [{}]", project.id);
    }
    Ok(())
}

fn archive(ctx: &Context, id: &str, archived: bool, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let project = if archived {
        store.archive_project(id)
    } else {
        store.unarchive_project(id)
    }
    .with_context(|| format!("failed to update project '{id}'"))?;

    if json {
        print_json(&project)?;
    } else if archived {
        println!("Archived project [{id}]");
    } else {
        println!("Unarchived project [{id}]");
    }
    Ok(())
}

fn delete(ctx: &Context, id: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let deleted = store
        .delete_project(id)
        .with_context(|| format!("failed to delete project '{id}'"))?;
    if !deleted {
        anyhow::bail!("project '{id}' not found");
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted project [{id}]");
    }
    Ok(())
}

fn stats(ctx: &Context, id: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let stats = store.project_stats(id)?;

    if json {
        print_json(&stats)?;
        return Ok(());
    }

    println!(
        "Tasks: {} | Completed: {} | Blocked: {} | Completion: {:.0}%",
        stats.total,
        stats.completed,
        stats.blocked,
        stats.completion * 100.0
    );
    println!();
    println!("BY SWIMLANE");
    for (lane, count) in &stats.by_swimlane {
        println!("  {lane:<18} {count}");
    }
    println!("BY PRIORITY");
    for (priority, count) in &stats.by_priority {
        println!("  {priority:<18} {count}");
    }
    Ok(())
}

fn check(ctx: &Context, id: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let report = store.check_project(id)?;

    if json {
        print_json(&report)?;
        return Ok(());
    }

    if report.is_clean() {
        println!("No problems found.");
        return Ok(());
    }
    for d in &report.dangling_dependencies {
        println!("  [dangling]   {} depends on missing task {}", d.task_id, d.missing);
    }
    for m in &report.unknown_swimlanes {
        println!("  [swimlane]   {} is in unknown swimlane {}", m.task_id, m.reference);
    }
    for m in &report.unknown_initiatives {
        println!("  [initiative] {} references unknown initiative {}", m.task_id, m.reference);
    }
    for t in &report.index_missing {
        println!("  [index]      {t} is missing or out of date in index.json");
    }
    for t in &report.index_stale {
        println!("  [index]      {t} is indexed but has no task file");
    }
    if !report.index_missing.is_empty() || !report.index_stale.is_empty() {
        println!("Run `kanban project reindex {id}` to repair the index.");
    }
    Ok(())
}

fn reindex(ctx: &Context, id: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let index = store
        .rebuild_index(id)
        .with_context(|| format!("failed to rebuild index for '{id}'"))?;

    if json {
        print_json(&serde_json::json!({ "project_id": id, "tasks": index.tasks.len() }))?;
    } else {
        println!("Reindexed {} task(s)", index.tasks.len());
    }
    Ok(())
}
