use crate::output::{print_json, print_table};
use crate::root::Context;

pub fn run(
    ctx: &Context,
    project: &str,
    query: &str,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let results = store.search_tasks(project, query, limit)?;

    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No tasks match '{query}'.");
        return Ok(());
    }
    let rows = results
        .iter()
        .map(|r| {
            vec![
                r.task_id.clone(),
                r.priority.clone(),
                r.swimlane.clone(),
                r.name.clone(),
                format!("{:.2}", r.score),
            ]
        })
        .collect();
    print_table(&["ID", "PRI", "SWIMLANE", "NAME", "SCORE"], rows);
    Ok(())
}
