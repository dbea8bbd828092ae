use crate::output::{opt, print_json, print_table};
use crate::root::Context;
use anyhow::Context as _;
use clap::Subcommand;
use kanban_core::{
    index::IndexEntry,
    store::{NewTask, TaskFilter, TaskUpdate},
    types::{ArtifactKind, Priority},
    KanbanError, KanbanStore,
};
use serde_json::{Map, Value};

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Create a task
    Create {
        project: String,
        #[arg(required = true)]
        name: Vec<String>,
        /// Swimlane id or name (default: first lane)
        #[arg(long)]
        swimlane: Option<String>,
        /// P0..P3 (default from config)
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        initiative: Option<String>,
        #[arg(long)]
        assign: Option<String>,
        /// Task ids this task depends on, comma-separated
        #[arg(long, value_delimiter = ',')]
        depends_on: Vec<String>,
        /// JSON object of free-form metadata
        #[arg(long)]
        metadata: Option<String>,
    },
    /// List tasks
    List {
        project: String,
        #[arg(long)]
        swimlane: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        initiative: Option<String>,
        #[arg(long)]
        assigned_to: Option<String>,
    },
    /// Show full details for a single task
    Show { project: String, id: String },
    /// Update task fields
    Update {
        project: String,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Move to this swimlane (id or name)
        #[arg(long)]
        swimlane: Option<String>,
        #[arg(long, conflicts_with = "clear_initiative")]
        initiative: Option<String>,
        #[arg(long)]
        clear_initiative: bool,
        #[arg(long, conflicts_with = "unassign")]
        assign: Option<String>,
        #[arg(long)]
        unassign: bool,
        /// JSON object merged into metadata; null values remove keys
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Move a task to another swimlane
    Move {
        project: String,
        id: String,
        swimlane: String,
    },
    /// Delete a task
    Delete { project: String, id: String },
    /// Add a comment to a task
    Comment {
        project: String,
        id: String,
        #[arg(required = true)]
        body: Vec<String>,
        /// Comment author (default: --actor)
        #[arg(long)]
        author: Option<String>,
    },
    /// Link a git commit to a task
    LinkCommit {
        project: String,
        id: String,
        hash: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Attach a file, url or doc reference to a task
    AddArtifact {
        project: String,
        id: String,
        name: String,
        path: String,
        /// file, url or doc
        #[arg(long, default_value = "file")]
        kind: String,
    },
    /// Make a task depend on another
    Depend {
        project: String,
        id: String,
        depends_on: String,
    },
    /// Remove a dependency
    Undepend {
        project: String,
        id: String,
        depends_on: String,
    },
    /// List the dependencies currently blocking a task
    Blockers { project: String, id: String },
    /// List every blocked task in a project
    Blocked { project: String },
}

pub fn run(ctx: &Context, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    match subcmd {
        TaskSubcommand::Create {
            project,
            name,
            swimlane,
            priority,
            description,
            initiative,
            assign,
            depends_on,
            metadata,
        } => {
            let input = NewTask {
                name: name.join(" "),
                swimlane,
                priority: parse_priority(priority.as_deref())?,
                description,
                initiative_id: initiative,
                assigned_to: assign,
                depends_on,
                metadata: parse_metadata(metadata.as_deref())?.unwrap_or_default(),
            };
            create(&store, &project, input, json)
        }
        TaskSubcommand::List {
            project,
            swimlane,
            priority,
            initiative,
            assigned_to,
        } => {
            let filter = TaskFilter {
                swimlane,
                priority: parse_priority(priority.as_deref())?,
                initiative_id: initiative,
                assigned_to,
            };
            list(&store, &project, &filter, json)
        }
        TaskSubcommand::Show { project, id } => show(&store, &project, &id, json),
        TaskSubcommand::Update {
            project,
            id,
            name,
            description,
            priority,
            swimlane,
            initiative,
            clear_initiative,
            assign,
            unassign,
            metadata,
        } => {
            let changes = TaskUpdate {
                name,
                description,
                priority: parse_priority(priority.as_deref())?,
                swimlane,
                initiative_id: clearable(initiative, clear_initiative),
                assigned_to: clearable(assign, unassign),
                metadata: parse_metadata(metadata.as_deref())?,
            };
            update(&store, &project, &id, changes, json)
        }
        TaskSubcommand::Move {
            project,
            id,
            swimlane,
        } => move_task(&store, &project, &id, &swimlane, json),
        TaskSubcommand::Delete { project, id } => delete(&store, &project, &id, json),
        TaskSubcommand::Comment {
            project,
            id,
            body,
            author,
        } => comment(&store, &project, &id, &body.join(" "), author, json),
        TaskSubcommand::LinkCommit {
            project,
            id,
            hash,
            message,
            url,
        } => link_commit(&store, &project, &id, &hash, message, url, json),
        TaskSubcommand::AddArtifact {
            project,
            id,
            name,
            path,
            kind,
        } => {
            let kind: ArtifactKind = kind.parse()?;
            add_artifact(&store, &project, &id, &name, kind, &path, json)
        }
        TaskSubcommand::Depend {
            project,
            id,
            depends_on,
        } => depend(&store, &project, &id, &depends_on, json),
        TaskSubcommand::Undepend {
            project,
            id,
            depends_on,
        } => undepend(&store, &project, &id, &depends_on, json),
        TaskSubcommand::Blockers { project, id } => blockers(&store, &project, &id, json),
        TaskSubcommand::Blocked { project } => blocked(&store, &project, json),
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn parse_priority(s: Option<&str>) -> anyhow::Result<Option<Priority>> {
    Ok(s.map(str::parse::<Priority>).transpose()?)
}

fn parse_metadata(s: Option<&str>) -> anyhow::Result<Option<Map<String, Value>>> {
    let Some(s) = s else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(s).context("--metadata is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(KanbanError::InvalidMetadata.into()),
    }
}

fn clearable(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

fn index_rows(tasks: &[IndexEntry]) -> Vec<Vec<String>> {
    tasks
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.priority.to_string(),
                t.name.clone(),
                opt(t.assigned_to.as_deref()),
                t.depends_on.join(","),
            ]
        })
        .collect()
}

const INDEX_HEADERS: &[&str] = &["ID", "PRI", "NAME", "ASSIGNEE", "DEPENDS"];

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn create(store: &KanbanStore, project: &str, input: NewTask, json: bool) -> anyhow::Result<()> {
    let task = store
        .create_task(project, input)
        .context("failed to create task")?;

    if json {
        print_json(&task)?;
    } else {
        println!("Created task [{}]: {}", task.id, task.name);
    }
    Ok(())
}

fn list(store: &KanbanStore, project: &str, filter: &TaskFilter, json: bool) -> anyhow::Result<()> {
    let tasks = store.list_tasks(project, filter)?;

    if json {
        print_json(&tasks)?;
        return Ok(());
    }

    let lanes = store.list_swimlanes(project)?;
    let rows = tasks
        .iter()
        .map(|t| {
            let lane = lanes
                .iter()
                .find(|l| l.id == t.swimlane)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| t.swimlane.clone());
            vec![
                t.id.clone(),
                lane,
                t.priority.to_string(),
                t.name.clone(),
                opt(t.assigned_to.as_deref()),
            ]
        })
        .collect();
    print_table(&["ID", "SWIMLANE", "PRI", "NAME", "ASSIGNEE"], rows);
    Ok(())
}

fn show(store: &KanbanStore, project: &str, id: &str, json: bool) -> anyhow::Result<()> {
    let task = store
        .get_task(project, id)?
        .with_context(|| format!("task '{id}' not found"))?;
    let blockers = store.blocking_tasks(project, id)?;

    if json {
        let mut value = serde_json::to_value(&task)?;
        if let Value::Object(map) = &mut value {
            map.insert("blocked".into(), Value::Bool(!blockers.is_empty()));
        }
        print_json(&value)?;
        return Ok(());
    }

    let lane = store
        .resolve_swimlane(project, &task.swimlane)
        .map(|l| l.name)
        .unwrap_or_else(|_| task.swimlane.clone());
    println!("[{}] {}", task.id, task.name);
    println!("Swimlane: {lane}   Priority: {}", task.priority);
    println!("Assignee: {}", opt(task.assigned_to.as_deref()));
    if let Some(init) = &task.initiative_id {
        println!("Initiative: {init}");
    }
    if !task.description.is_empty() {
        println!();
        println!("{}", task.description);
    }
    if !task.depends_on.is_empty() {
        println!();
        println!("Depends on: {}", task.depends_on.join(", "));
        if !blockers.is_empty() {
            let ids: Vec<&str> = blockers.iter().map(|b| b.id.as_str()).collect();
            println!("Blocked by: {}", ids.join(", "));
        }
    }
    if !task.commits.is_empty() {
        println!();
        println!("COMMITS");
        for c in &task.commits {
            println!("  {} {}", c.hash, c.message.as_deref().unwrap_or(""));
        }
    }
    if !task.artifacts.is_empty() {
        println!();
        println!("ARTIFACTS");
        for a in &task.artifacts {
            println!("  [{}] {} {}", a.kind, a.name, a.path);
        }
    }
    if !task.comments.is_empty() {
        println!();
        println!("COMMENTS");
        for c in &task.comments {
            let who = c.author.as_deref().unwrap_or("anonymous");
            println!("  [{}] {who}: {}", c.id, c.body);
        }
    }
    Ok(())
}

fn update(
    store: &KanbanStore,
    project: &str,
    id: &str,
    update: TaskUpdate,
    json: bool,
) -> anyhow::Result<()> {
    let task = store
        .update_task(project, id, update)
        .with_context(|| format!("failed to update task '{id}'"))?;

    if json {
        print_json(&task)?;
    } else {
        println!("Updated task [{}]", task.id);
    }
    Ok(())
}

fn move_task(
    store: &KanbanStore,
    project: &str,
    id: &str,
    swimlane: &str,
    json: bool,
) -> anyhow::Result<()> {
    let task = store
        .move_task(project, id, swimlane)
        .with_context(|| format!("failed to move task '{id}'"))?;

    if json {
        print_json(&task)?;
    } else {
        println!("Moved task [{id}] to {swimlane}");
    }
    Ok(())
}

fn delete(store: &KanbanStore, project: &str, id: &str, json: bool) -> anyhow::Result<()> {
    if !store.delete_task(project, id)? {
        anyhow::bail!("task '{id}' not found");
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "deleted": true }))?;
    } else {
        println!("Deleted task [{id}]");
    }
    Ok(())
}

fn comment(
    store: &KanbanStore,
    project: &str,
    id: &str,
    body: &str,
    author: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let c = store
        .add_comment(project, id, body, author)
        .with_context(|| format!("failed to comment on task '{id}'"))?;

    if json {
        print_json(&c)?;
    } else {
        println!("Added comment [{}] to task [{id}]", c.id);
    }
    Ok(())
}

fn link_commit(
    store: &KanbanStore,
    project: &str,
    id: &str,
    hash: &str,
    message: Option<String>,
    url: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let task = store
        .link_commit(project, id, hash, message, url)
        .with_context(|| format!("failed to link commit to task '{id}'"))?;

    if json {
        print_json(&task.commits)?;
    } else {
        println!("Linked {hash} to task [{id}]");
    }
    Ok(())
}

fn add_artifact(
    store: &KanbanStore,
    project: &str,
    id: &str,
    name: &str,
    kind: ArtifactKind,
    path: &str,
    json: bool,
) -> anyhow::Result<()> {
    let artifact = store
        .add_artifact(project, id, name, kind, path)
        .with_context(|| format!("failed to add artifact to task '{id}'"))?;

    if json {
        print_json(&artifact)?;
    } else {
        println!("Added {kind} artifact '{name}' to task [{id}]");
    }
    Ok(())
}

fn depend(
    store: &KanbanStore,
    project: &str,
    id: &str,
    depends_on: &str,
    json: bool,
) -> anyhow::Result<()> {
    let task = store.add_dependency(project, id, depends_on)?;
    let blocked = store.is_blocked(project, id)?;

    if json {
        print_json(&serde_json::json!({
            "id": task.id,
            "depends_on": task.depends_on,
            "blocked": blocked,
        }))?;
    } else {
        println!("Task [{id}] depends on [{depends_on}]");
    }
    Ok(())
}

fn undepend(
    store: &KanbanStore,
    project: &str,
    id: &str,
    depends_on: &str,
    json: bool,
) -> anyhow::Result<()> {
    let removed = store.remove_dependency(project, id, depends_on)?;

    if json {
        print_json(&serde_json::json!({ "id": id, "depends_on": depends_on, "removed": removed }))?;
    } else if removed {
        println!("Task [{id}] no longer depends on [{depends_on}]");
    } else {
        println!("Task [{id}] did not depend on [{depends_on}]");
    }
    Ok(())
}

fn blockers(store: &KanbanStore, project: &str, id: &str, json: bool) -> anyhow::Result<()> {
    let blockers = store.blocking_tasks(project, id)?;

    if json {
        print_json(&blockers)?;
    } else {
        print_table(INDEX_HEADERS, index_rows(&blockers));
    }
    Ok(())
}

fn blocked(store: &KanbanStore, project: &str, json: bool) -> anyhow::Result<()> {
    let blocked = store.blocked_tasks(project)?;

    if json {
        print_json(&blocked)?;
    } else {
        print_table(INDEX_HEADERS, index_rows(&blocked));
    }
    Ok(())
}
