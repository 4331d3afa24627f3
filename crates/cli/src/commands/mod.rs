use clap::Subcommand;
use codeon_config::EngineConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

pub mod cache;
pub mod languages;
pub mod run;
pub mod serve;

pub use self::cache::CacheCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Compile (if needed) and run a source file
    Run {
        /// Language id, see `codeon languages`
        #[arg(short, long)]
        language: String,

        /// Text fed to the program's stdin
        #[arg(short, long, conflicts_with = "input_file")]
        input: Option<String>,

        /// File whose contents are fed to the program's stdin
        #[arg(long, value_name = "PATH")]
        input_file: Option<PathBuf>,

        /// Print the full result as JSON instead of replaying the output
        #[arg(long)]
        json: bool,

        /// Source file, or `-` to read it from stdin
        file: PathBuf,
    },

    /// List the languages this configuration supports
    Languages,

    /// Manage the build cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Serve the JSON API over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

impl Commands {
    pub async fn execute(self, config: EngineConfig) -> eyre::Result<ExitCode> {
        match self {
            Commands::Run {
                language,
                input,
                input_file,
                json,
                file,
            } => {
                let input = match (input, input_file) {
                    (Some(text), _) => run::Input::Text(text),
                    (None, Some(path)) => run::Input::File(path),
                    (None, None) => run::Input::Empty,
                };
                run::execute(&config, &language, &file, input, json).await
            }
            Commands::Languages => languages::execute(&config).map(|()| ExitCode::SUCCESS),
            Commands::Cache { command } => command.execute(&config).map(|()| ExitCode::SUCCESS),
            Commands::Serve { addr } => serve::execute(&config, addr)
                .await
                .map(|()| ExitCode::SUCCESS),
        }
    }
}
