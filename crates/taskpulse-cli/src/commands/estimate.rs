use chrono::{DateTime, Utc};
use serde::Serialize;
use taskpulse_core::RiskLevel;

use super::{local, CmdResult, Context};

#[derive(Serialize)]
struct EstimateRow {
    id: String,
    content: String,
    estimated_minutes: Option<u32>,
    adjusted_minutes: u32,
    deadline: Option<DateTime<Utc>>,
    realistic_deadline: Option<DateTime<Utc>>,
    procrastination_risk: RiskLevel,
}

pub fn run(ctx: &Context, id: Option<&str>) -> CmdResult {
    let tasks = match id {
        Some(id) => vec![ctx.find_task(id)?],
        None => ctx
            .load_tasks()?
            .into_iter()
            .filter(|t| !t.completed)
            .collect(),
    };
    let session = ctx.session();
    let offset = session.model().offset();

    let rows: Vec<EstimateRow> = tasks
        .iter()
        .map(|t| EstimateRow {
            id: t.id.clone(),
            content: t.content.clone(),
            estimated_minutes: t.estimated_time,
            adjusted_minutes: session.adjusted_estimate(t),
            deadline: t.deadline,
            realistic_deadline: session.realistic_deadline(t),
            procrastination_risk: session.procrastination_risk(t),
        })
        .collect();

    if ctx.json {
        return ctx.print_json(&rows);
    }
    if rows.is_empty() {
        println!("no tasks");
        return Ok(());
    }
    for row in &rows {
        let estimate = row
            .estimated_minutes
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        println!("{}  {}", row.id, row.content);
        println!("    estimate   {estimate} min -> {} min", row.adjusted_minutes);
        if let (Some(deadline), Some(realistic)) = (row.deadline, row.realistic_deadline) {
            println!(
                "    deadline   {} (aim for {})",
                local(deadline, offset),
                local(realistic, offset)
            );
        }
        println!("    risk       {}", row.procrastination_risk.as_str());
    }
    Ok(())
}
