use std::sync::Arc;
use taskpulse_core::scheduler::driver;
use taskpulse_core::{LogSink, SystemClock};
use tokio::sync::{watch, Mutex};

use super::{CmdResult, Context, StdoutSink};

pub fn run(ctx: &Context) -> CmdResult {
    if ctx.now.is_some() {
        return Err("watch runs on the system clock; drop --now".into());
    }
    // Fail fast on an unreadable task file; later reads only warn
    ctx.load_tasks()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut session = ctx
            .session_with(SystemClock)
            .with_sinks(StdoutSink { json: ctx.json }, LogSink);
        let armed = session.start().len();
        tracing::info!(timers = armed, "watching for due reminders, ctrl-c to stop");

        let session = Arc::new(Mutex::new(session));
        let (stop, stopped) = watch::channel(false);
        let driver = tokio::spawn(driver::run(Arc::clone(&session), stopped));

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        let _ = stop.send(true);
        let dispatched = driver.await?;
        tracing::info!(dispatched, "stopped");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
