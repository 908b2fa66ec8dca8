use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mdlive")]
#[command(author, version, about)]
#[command(long_about = "Live collaborative markdown slide decks.\n\n\
    Edit one markdown document from many places and watch it render as slides.\n\
    One presenter navigates, everyone else follows.\n\n\
    Examples:\n  \
    mdlive slides talk.md                 List the slides in a file\n  \
    mdlive watch talk.md --file-id abc    Push every save of talk.md to the server\n  \
    mdlive follow abc                     Follow (and drive) a presentation from the terminal\n  \
    mdlive demo talk.md                   Two in-process clients, no server needed")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a markdown file into slides and list them
    Slides {
        /// Markdown file
        file: PathBuf,
    },

    /// Print the editor highlight markup for a markdown file
    Highlight {
        /// Markdown file
        file: PathBuf,
    },

    /// Watch a markdown file and push every change to the server
    Watch {
        /// Markdown file to watch
        file: PathBuf,

        /// Server-side document id
        #[arg(long)]
        file_id: String,

        /// WebSocket endpoint (overrides server.url)
        #[arg(long)]
        server: Option<String>,
    },

    /// Join a presentation, print slide and page changes, navigate from stdin
    Follow {
        /// Server-side document id
        file_id: String,

        /// WebSocket endpoint (overrides server.url)
        #[arg(long)]
        server: Option<String>,
    },

    /// Check whether the server knows a document
    Check {
        /// Server-side document id
        file_id: String,
    },

    /// List recently used presentations
    Recent {
        /// Remove entries the server no longer has
        #[arg(long)]
        prune: bool,
    },

    /// Check that a file would be accepted for upload
    Validate {
        /// File to check
        file: PathBuf,
    },

    /// Run a presenter and a follower against an in-process server
    Demo {
        /// Markdown file to present
        file: PathBuf,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. server.url, sync.debounce_ms, viewport.max_scale)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let quiet = self.quiet;
        match self.command {
            Some(Commands::Slides { file }) => crate::commands::slides::run(&file),
            Some(Commands::Highlight { file }) => crate::commands::highlight::run(&file),
            Some(Commands::Watch {
                file,
                file_id,
                server,
            }) => crate::commands::watch::run(file, file_id, server, quiet),
            Some(Commands::Follow { file_id, server }) => {
                crate::commands::follow::run(file_id, server)
            }
            Some(Commands::Check { file_id }) => crate::commands::check::run(&file_id),
            Some(Commands::Recent { prune }) => crate::commands::recent::run(prune),
            Some(Commands::Validate { file }) => crate::commands::validate::run(&file),
            Some(Commands::Demo { file }) => crate::commands::demo::run(&file),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("mdlive {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                use clap::CommandFactory;
                let mut cmd = Self::command();
                cmd.print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
