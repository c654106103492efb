use super::{CmdResult, Context};

pub fn run(ctx: &Context) -> CmdResult {
    let tasks = ctx.load_tasks()?;
    let suggestions = taskpulse_core::suggest(&tasks, ctx.now());

    if ctx.json {
        return ctx.print_json(&suggestions);
    }
    if suggestions.is_empty() {
        println!("nothing to suggest");
        return Ok(());
    }
    for s in &suggestions {
        println!("{}. [{:?}] {}", s.priority_order, s.kind, s.title);
        println!("   {}", s.message);
    }
    Ok(())
}
