use crate::output::{opt, print_json, print_table};
use crate::root::Context;
use anyhow::Context as _;
use clap::Subcommand;
use kanban_core::store::{NewSwimlane, SwimlaneUpdate};

#[derive(Subcommand)]
pub enum SwimlaneSubcommand {
    /// List a project's swimlanes in board order
    List { project: String },
    /// Add a swimlane
    Add {
        project: String,
        name: String,
        /// Board position (default: after the last lane)
        #[arg(long)]
        order: Option<u32>,
        /// Tasks in this lane count as done
        #[arg(long)]
        complete: bool,
        #[arg(long)]
        color: Option<String>,
    },
    /// Update a swimlane (by id or name)
    Update {
        project: String,
        lane: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        order: Option<u32>,
        /// Set whether tasks in this lane count as done
        #[arg(long)]
        complete: Option<bool>,
        #[arg(long, conflicts_with = "clear_color")]
        color: Option<String>,
        #[arg(long)]
        clear_color: bool,
    },
    /// Delete an empty swimlane (by id or name)
    Delete { project: String, lane: String },
}

pub fn run(ctx: &Context, subcmd: SwimlaneSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SwimlaneSubcommand::List { project } => list(ctx, &project, json),
        SwimlaneSubcommand::Add {
            project,
            name,
            order,
            complete,
            color,
        } => add(
            ctx,
            &project,
            NewSwimlane {
                name,
                order,
                is_complete: complete,
                color,
            },
            json,
        ),
        SwimlaneSubcommand::Update {
            project,
            lane,
            name,
            order,
            complete,
            color,
            clear_color,
        } => {
            let color = if clear_color {
                Some(None)
            } else {
                color.map(Some)
            };
            let update = SwimlaneUpdate {
                name,
                order,
                is_complete: complete,
                color,
            };
            update_lane(ctx, &project, &lane, update, json)
        }
        SwimlaneSubcommand::Delete { project, lane } => delete(ctx, &project, &lane, json),
    }
}

fn list(ctx: &Context, project: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let lanes = store.list_swimlanes(project)?;

    if json {
        print_json(&lanes)?;
        return Ok(());
    }

    let rows = lanes
        .iter()
        .map(|l| {
            vec![
                l.order.to_string(),
                l.id.clone(),
                l.name.clone(),
                if l.is_complete { "yes" } else { "no" }.to_string(),
                opt(l.color.as_deref()),
            ]
        })
        .collect();
    print_table(&["ORDER", "ID", "NAME", "COMPLETE", "COLOR"], rows);
    Ok(())
}

fn add(ctx: &Context, project: &str, input: NewSwimlane, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let lane = store
        .add_swimlane(project, input)
        .context("failed to add swimlane")?;

    if json {
        print_json(&lane)?;
    } else {
        println!("Added swimlane [{}]: {}", lane.id, lane.name);
    }
    Ok(())
}

fn update_lane(
    ctx: &Context,
    project: &str,
    lane: &str,
    update: SwimlaneUpdate,
    json: bool,
) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let lane = store
        .update_swimlane(project, lane, update)
        .with_context(|| format!("failed to update swimlane '{lane}'"))?;

    if json {
        print_json(&lane)?;
    } else {
        println!("Updated swimlane [{}]: {}", lane.id, lane.name);
    }
    Ok(())
}

fn delete(ctx: &Context, project: &str, lane: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let deleted = store
        .delete_swimlane(project, lane)
        .with_context(|| format!("failed to delete swimlane '{lane}'"))?;
    if !deleted {
        anyhow::bail!("swimlane '{lane}' not found");
    }

    if json {
        print_json(&serde_json::json!({ "swimlane": lane, "deleted": true }))?;
    } else {
        println!("Deleted swimlane '{lane}'");
    }
    Ok(())
}
