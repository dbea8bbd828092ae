use crate::output::{opt, print_json, print_table};
use crate::root::Context;
use anyhow::Context as _;
use chrono::NaiveDate;
use clap::Subcommand;
use kanban_core::{
    store::{InitiativeUpdate, NewInitiative},
    types::InitiativeStatus,
    KanbanStore,
};

#[derive(Subcommand)]
pub enum InitiativeSubcommand {
    /// Create an initiative
    Create {
        project: String,
        name: String,
        #[arg(long)]
        goal: Option<String>,
        /// planning, active, completed or archived
        #[arg(long)]
        status: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// YYYY-MM-DD
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List initiatives
    List {
        project: String,
        #[arg(long)]
        status: Option<String>,
    },
    /// Show an initiative and its tasks
    Show { project: String, id: String },
    /// Update an initiative
    Update {
        project: String,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, conflicts_with = "clear_dates")]
        start: Option<NaiveDate>,
        #[arg(long, conflicts_with = "clear_dates")]
        end: Option<NaiveDate>,
        /// Remove both start and end dates
        #[arg(long)]
        clear_dates: bool,
    },
    /// Delete an initiative; its tasks are kept and unlinked
    Delete { project: String, id: String },
}

pub fn run(ctx: &Context, subcmd: InitiativeSubcommand, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    match subcmd {
        InitiativeSubcommand::Create {
            project,
            name,
            goal,
            status,
            start,
            end,
        } => {
            let input = NewInitiative {
                name,
                goal,
                status: parse_status(status.as_deref())?,
                start_date: start,
                end_date: end,
            };
            create(&store, &project, input, json)
        }
        InitiativeSubcommand::List { project, status } => {
            list(&store, &project, parse_status(status.as_deref())?, json)
        }
        InitiativeSubcommand::Show { project, id } => show(&store, &project, &id, json),
        InitiativeSubcommand::Update {
            project,
            id,
            name,
            goal,
            status,
            start,
            end,
            clear_dates,
        } => {
            let (start_date, end_date) = if clear_dates {
                (Some(None), Some(None))
            } else {
                (start.map(Some), end.map(Some))
            };
            let changes = InitiativeUpdate {
                name,
                goal: goal.map(Some),
                status: parse_status(status.as_deref())?,
                start_date,
                end_date,
            };
            update(&store, &project, &id, changes, json)
        }
        InitiativeSubcommand::Delete { project, id } => delete(&store, &project, &id, json),
    }
}

fn parse_status(s: Option<&str>) -> anyhow::Result<Option<InitiativeStatus>> {
    Ok(s.map(str::parse::<InitiativeStatus>).transpose()?)
}

fn create(
    store: &KanbanStore,
    project: &str,
    input: NewInitiative,
    json: bool,
) -> anyhow::Result<()> {
    let initiative = store
        .create_initiative(project, input)
        .context("failed to create initiative")?;

    if json {
        print_json(&initiative)?;
    } else {
        println!("Created initiative [{}]: {}", initiative.id, initiative.name);
    }
    Ok(())
}

fn list(
    store: &KanbanStore,
    project: &str,
    status: Option<InitiativeStatus>,
    json: bool,
) -> anyhow::Result<()> {
    let initiatives = store.list_initiatives(project, status)?;

    if json {
        print_json(&initiatives)?;
        return Ok(());
    }

    let rows = initiatives
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.status.to_string(),
                i.name.clone(),
                i.start_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                i.end_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "NAME", "START", "END"], rows);
    Ok(())
}

fn show(store: &KanbanStore, project: &str, id: &str, json: bool) -> anyhow::Result<()> {
    let initiative = store
        .get_initiative(project, id)?
        .with_context(|| format!("initiative '{id}' not found"))?;
    let tasks = store.initiative_tasks(project, id)?;

    if json {
        let mut value = serde_json::to_value(&initiative)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert("tasks".into(), serde_json::to_value(&tasks)?);
        }
        print_json(&value)?;
        return Ok(());
    }

    println!("[{}] {} ({})", initiative.id, initiative.name, initiative.status);
    println!("Goal: {}", opt(initiative.goal.as_deref()));
    let rows = tasks
        .iter()
        .map(|t| vec![t.id.clone(), t.priority.to_string(), t.name.clone()])
        .collect();
    println!();
    print_table(&["ID", "PRI", "NAME"], rows);
    Ok(())
}

fn update(
    store: &KanbanStore,
    project: &str,
    id: &str,
    changes: InitiativeUpdate,
    json: bool,
) -> anyhow::Result<()> {
    let initiative = store
        .update_initiative(project, id, changes)
        .with_context(|| format!("failed to update initiative '{id}'"))?;

    if json {
        print_json(&initiative)?;
    } else {
        println!("Updated initiative [{}]", initiative.id);
    }
    Ok(())
}

fn delete(store: &KanbanStore, project: &str, id: &str, json: bool) -> anyhow::Result<()> {
    if !store.delete_initiative(project, id)? {
        anyhow::bail!("initiative '{id}' not found");
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted initiative [{id}]");
    }
    Ok(())
}
