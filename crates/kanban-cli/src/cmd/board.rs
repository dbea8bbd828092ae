use crate::output::print_json;
use crate::root::Context;

pub fn run(ctx: &Context, project: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let board = store.board(project)?;

    if json {
        return print_json(&board);
    }

    for column in &board.columns {
        let done = if column.lane.is_complete { " (done)" } else { "" };
        println!("{} [{}]{done}", column.lane.name, column.tasks.len());
        for card in &column.tasks {
            let flag = if card.blocked { " BLOCKED" } else { "" };
            println!(
                "  {} {} {}{flag}",
                card.task.id, card.task.priority, card.task.name
            );
        }
        println!();
    }
    if !board.unplaced.is_empty() {
        println!("Unplaced [{}]", board.unplaced.len());
        for card in &board.unplaced {
            println!("  {} {} (lane {})", card.task.id, card.task.name, card.task.swimlane);
        }
    }
    Ok(())
}
