use clap::Parser;

mod commands;
mod utils;

use commands::Commands;

/// docstore - inspect and exercise docstore-crud collection configurations
#[derive(Parser)]
#[command(name = "docstore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON tracing output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = commands::execute(cli.command, cli.verbose).await {
        utils::error(&e.to_string());
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_demo() {
        let cli = Cli::try_parse_from(["docstore", "demo", "--collection", "kits", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Demo { collection: Some(ref name), .. } if name == "kits"
        ));
    }
}
