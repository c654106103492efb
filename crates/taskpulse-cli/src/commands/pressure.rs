use serde::Serialize;
use taskpulse_core::pressure::summarize;
use taskpulse_core::suggestions::rank_active;
use taskpulse_core::{classify, PressureClassification};

use super::{CmdResult, Context};

#[derive(Serialize)]
struct Row<'a> {
    id: &'a str,
    content: &'a str,
    #[serde(flatten)]
    pressure: &'a PressureClassification,
}

pub fn run(ctx: &Context, all: bool) -> CmdResult {
    let tasks = ctx.load_tasks()?;
    let now = ctx.now();

    let classified: Vec<_> = tasks
        .iter()
        .map(|t| (t, classify(t, now)))
        .collect();
    let mut ranked = rank_active(&classified);
    if all {
        ranked.extend(classified.iter().filter(|(t, _)| t.completed));
    }

    if ctx.json {
        let rows: Vec<Row<'_>> = ranked
            .iter()
            .map(|(t, p)| Row {
                id: &t.id,
                content: &t.content,
                pressure: p,
            })
            .collect();
        return ctx.print_json(&rows);
    }

    if ranked.is_empty() {
        println!("no tasks");
        return Ok(());
    }
    for (task, p) in &ranked {
        println!(
            "{:<9} {:>3}  {:<12} {}  ({})",
            p.name, p.urgency, task.id, task.content, p.message
        );
    }
    let summary = summarize(classified.iter().map(|(_, p)| p));
    println!();
    println!("{} tasks, {} under pressure", summary.total(), summary.pressing());
    Ok(())
}
