use crate::output::{opt, print_json, print_table};
use crate::root::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use kanban_core::activity::ActivityEntry;

#[derive(Subcommand)]
pub enum ActivitySubcommand {
    /// Show activity, newest first
    List {
        project: String,
        /// Only this day (YYYY-MM-DD); entries oldest first
        #[arg(long, conflicts_with = "limit")]
        date: Option<NaiveDate>,
        /// Maximum entries (default: activity_limit from config)
        #[arg(long)]
        limit: Option<usize>,
        /// Only entries about this task
        #[arg(long)]
        task: Option<String>,
    },
}

pub fn run(ctx: &Context, subcmd: ActivitySubcommand, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    match subcmd {
        ActivitySubcommand::List {
            project,
            date,
            limit,
            task,
        } => {
            let entries = match date {
                Some(day) => {
                    let mut entries = store.activity_for_date(&project, day)?;
                    if let Some(t) = &task {
                        entries.retain(|e| e.task_id.as_ref() == Some(t));
                    }
                    entries
                }
                None => store.recent_activity(&project, limit, task.as_deref())?,
            };
            print_entries(&entries, json)
        }
    }
}

fn print_entries(entries: &[ActivityEntry], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&entries);
    }

    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.kind.to_string(),
                opt(e.task_id.as_deref()),
                opt(e.actor.as_deref()),
                e.summary.clone(),
            ]
        })
        .collect();
    print_table(&["TIME", "TYPE", "TASK", "ACTOR", "SUMMARY"], rows);
    Ok(())
}
