use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load_or_default();
            let path = Config::path()?;
            println!("{} {}", "Config file:".bold(), path.display());
            println!();
            let session = config.session_config();
            let viewport = session.presenter.viewport;
            println!("  server.url                 {}", config.server_url());
            println!("  server.http                {}", config.http_url());
            println!("  sync.debounce_ms           {}", session.sync.debounce.as_millis());
            println!("  sync.in_flight_ms          {}", session.sync.in_flight.as_millis());
            println!(
                "  sync.reconnect_ms          {}",
                config.runtime_config().reconnect.as_millis()
            );
            println!("  viewport.min_scale         {}", viewport.min_scale);
            println!("  viewport.max_scale         {}", viewport.max_scale);
            println!("  viewport.step              {}", viewport.step);
            println!("  presenter.swipe_threshold  {}", session.presenter.swipe_threshold);
            println!("  presenter.theme            {}", session.presenter.theme);
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!("{} {key} = {value}", "Set".green());
            println!("  {}", path.display().to_string().dimmed());
            Ok(())
        }
    }
}
