use clap::Subcommand;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum PatternsAction {
    /// Learned multipliers and what they suggest
    Show,
    /// Work-habit risk factors from the current tasks
    Report,
    /// Forget everything learned
    Reset,
}

pub fn run(ctx: &Context, action: PatternsAction) -> CmdResult {
    match action {
        PatternsAction::Show => {
            let session = ctx.session();
            if ctx.json {
                return ctx.print_json(session.patterns());
            }
            print!("{}", session.insights().render());
        }
        PatternsAction::Report => {
            let session = ctx.session();
            let report = session.detect_patterns();
            if ctx.json {
                return ctx.print_json(&report);
            }
            println!(
                "{} tasks, {} completed ({} timed)",
                report.total_tasks, report.completed_tasks, report.timed_completions
            );
            if let Some(rate) = report.completion_rate {
                println!("completion rate   {:.0}%", rate * 100.0);
            }
            if let Some(rate) = report.overdue_rate {
                println!("overdue rate      {:.0}%", rate * 100.0);
            }
            if let Some(accuracy) = report.average_accuracy {
                println!("estimate accuracy {:.0}%", accuracy * 100.0);
            }
            println!(
                "coefficient       {:.2} (confidence {:.0}%)",
                report.procrastination_coefficient,
                report.confidence * 100.0
            );
            for factor in &report.risk_factors {
                println!("- {}", factor.description);
                println!("  {}", factor.suggestion);
            }
        }
        PatternsAction::Reset => {
            let mut session = ctx.session();
            session.reset_patterns();
            println!("patterns reset");
        }
    }
    Ok(())
}
