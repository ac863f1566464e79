use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mover-cmd")]
#[command(about = "Drive the data-server write path against local files")]
#[command(version)]
struct Cli {
    /// Path to a JSON mover configuration (defaults are used if omitted)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the contents of a source file into a target file at an offset
    Write {
        /// Source file whose bytes are written
        #[arg(short, long)]
        input: String,

        /// Byte offset in the target file
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Account reserved space against a pool of this many bytes instead of
        /// preallocating the target file
        #[arg(long)]
        pool: Option<u64>,

        /// Target file (created if missing)
        target: String,
    },

    /// Replay a JSON write script through the NFSv4.1 WRITE operation
    Replay {
        /// Path to the JSON script (a list of writes)
        #[arg(short, long)]
        script: String,

        /// Account reserved space against a pool of this many bytes
        #[arg(long)]
        pool: Option<u64>,

        /// Target file (created if missing)
        target: String,
    },

    /// Print the effective configuration
    ShowConfig,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Write {
            input,
            offset,
            pool,
            target,
        } => commands::write::run(&config, input, offset, pool, target),
        Commands::Replay {
            script,
            pool,
            target,
        } => commands::replay::run(&config, script, pool, target),
        Commands::ShowConfig => commands::show_config(&config),
    }
}
