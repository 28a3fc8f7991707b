pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::InstallOptions;
use crate::platform::PlatformProfile;
use crate::ui;

const AFTER_HELP: &str = "\
Examples:
  better-terminal install
  better-terminal install --skip-backup
  better-terminal install --dry-run
  better-terminal check
  better-terminal backup
  better-terminal backup ~/my-backups
  better-terminal restore ~/.better-terminal-backups/2024-01-01-120000

Installs zsh, oh-my-zsh, Antigen, fzf, eza, carapace, asdf with Node.js,
tmux with TPM and the FiraCode Nerd Font, then writes a Tokyo Night themed
configuration.";

#[derive(Parser, Debug)]
#[command(name = "better-terminal")]
#[command(about = "One-command terminal setup with zsh, oh-my-zsh, fzf, asdf, tmux, and more")]
#[command(disable_version_flag = true)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Show version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Install and configure everything
    Install {
        /// Skip configuration backup
        #[arg(long)]
        skip_backup: bool,

        /// Preview installation without making changes
        #[arg(long)]
        dry_run: bool,

        /// Install only essentials (no fonts, no carapace)
        #[arg(long)]
        minimal: bool,

        /// Ask before each step
        #[arg(long)]
        interactive: bool,
    },

    /// Check system requirements
    Check,

    /// Backup existing configurations
    Backup {
        /// Directory to hold the timestamped backup (default: ~/.better-terminal-backups)
        destination: Option<String>,
    },

    /// Restore configurations from a backup directory
    Restore {
        /// Backup directory, e.g. ~/.better-terminal-backups/2024-01-01-120000
        backup_path: Option<String>,
    },
}

impl Cli {
    /// Run the selected command. `Ok(false)` means the command ran but did
    /// not succeed.
    pub async fn execute(self) -> Result<bool> {
        if self.version {
            println!("better-terminal v{}", env!("CARGO_PKG_VERSION"));
            return Ok(true);
        }

        let Some(command) = self.command else {
            Cli::command().print_help()?;
            println!();
            return Ok(true);
        };

        if matches!(command, Commands::Restore { backup_path: None }) {
            ui::error("Backup path is required");
            ui::info("Usage: better-terminal restore <backup-path>");
            return Ok(false);
        }

        let profile = PlatformProfile::detect()?;
        let config = AppConfig::load(&profile.home_dir)?;

        match command {
            Commands::Install {
                skip_backup,
                dry_run,
                minimal,
                interactive,
            } => {
                let options = InstallOptions {
                    skip_backup,
                    dry_run,
                    minimal,
                    interactive,
                };
                commands::install::execute(profile, config, options).await
            }
            Commands::Check => commands::check::execute(profile, config).await,
            Commands::Backup { destination } => {
                commands::backup::execute(&profile, &config, destination.as_deref()).await
            }
            Commands::Restore { backup_path } => match backup_path {
                Some(path) => commands::restore::execute(&profile, &config, &path).await,
                None => Ok(false),
            },
        }
    }
}
