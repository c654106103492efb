use super::{CmdResult, Context};

pub fn run(ctx: &Context) -> CmdResult {
    let tasks = ctx.load_tasks()?;
    let conflicts = taskpulse_core::find_conflicts(&tasks, ctx.now());

    if ctx.json {
        return ctx.print_json(&conflicts);
    }
    if conflicts.is_empty() {
        println!("no conflicts");
        return Ok(());
    }
    for c in &conflicts {
        println!(
            "{:<12} {:>6}  {} min of work in {} min ({:.2}x)",
            c.window.label(),
            format!("{:?}", c.severity).to_lowercase(),
            c.total_estimated_minutes,
            c.available_minutes,
            c.overcommitment_ratio
        );
        for t in &c.tasks {
            println!("    {}  {}", t.id, t.content);
        }
    }
    Ok(())
}
