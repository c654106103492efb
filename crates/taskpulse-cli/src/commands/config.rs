use clap::Subcommand;
use taskpulse_core::Config;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "notifications.quiet_hours.start")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value (JSON for lists and tables)
        value: String,
    },
    /// Show the whole configuration
    Show,
    /// Reset config to defaults
    Reset,
}

pub fn run(ctx: &Context, action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = ctx.config()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = ctx.config()?;
            config.apply(&key, &value)?;
            config.save_to(&ctx.config_path())?;
            tracing::debug!(%key, %value, "config updated");
            println!("ok");
        }
        ConfigAction::Show => {
            let config = ctx.config()?;
            if ctx.json {
                return ctx.print_json(&config);
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save_to(&ctx.config_path())?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
