use taskpulse_core::Event;

use super::{CmdResult, Context};

pub fn run(ctx: &Context, id: &str) -> CmdResult {
    let task = ctx.find_task(id)?;
    if !task.completed {
        return Err(format!("task {id} is not completed").into());
    }

    let mut session = ctx.session();
    if session.patterns().has_learned(id) {
        return Err(format!("already learned from {id}").into());
    }
    let events = session.record_completion(&task);
    let updated = events.iter().find_map(|e| match e {
        Event::PatternsUpdated {
            version,
            procrastination_coefficient,
            ..
        } => Some((*version, *procrastination_coefficient)),
        _ => None,
    });

    if ctx.json {
        return ctx.print_json(&events);
    }
    match updated {
        Some((version, coefficient)) => {
            println!("learned from {id}: coefficient {coefficient:.2} (version {version})");
        }
        None => println!("nothing to learn from {id}"),
    }
    Ok(())
}
