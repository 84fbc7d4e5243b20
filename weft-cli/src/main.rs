use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weft", version, about = "Weft CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile template files and report errors.
    Check {
        /// Print the compiled node outline of each file
        #[arg(long)]
        tree: bool,
        /// Template files; each may use the components of the files before it
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Check { tree, inputs } => weft_cli::check_cmd(&inputs, tree)?,
    }
    Ok(())
}
