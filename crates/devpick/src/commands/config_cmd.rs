//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let format = config::output_format(global, &cfg);
            let out = match format {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(devpick_config::ConfigError::from)?
                    .trim_end()
                    .to_owned(),
                _ => output::render_single(&format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::active_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { force } => {
            let path = config::active_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
