use taskpulse_core::scheduler::ScheduledTimer;

use super::{local, CmdResult, Context};

pub fn run(ctx: &Context) -> CmdResult {
    ctx.load_tasks()?;
    let mut session = ctx.session();
    session.start();

    let offset = session.scheduler().offset();
    let timers: Vec<&ScheduledTimer> = session.scheduler().timers().collect();

    if ctx.json {
        return ctx.print_json(&timers);
    }
    for timer in &timers {
        let subject = timer
            .payload
            .task()
            .map(|t| format!("  ({})", t.content))
            .unwrap_or_default();
        println!("{}  {}{subject}", local(timer.fire_at, offset), timer.key);
    }
    println!();
    println!("{} timers armed", timers.len());
    Ok(())
}
