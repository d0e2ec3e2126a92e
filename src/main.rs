use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Pill photo identification with drug-interaction warnings
#[derive(Parser)]
#[command(name = "moyak")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address, overrides MOYAK_BIND_ADDR
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Identify the pills in one photo and print the report
    Identify {
        /// Image file (JPEG or PNG)
        image: PathBuf,
        /// Print the JSON response body instead of Markdown
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// The subcommand to run; a bare `moyak` serves.
    fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve { bind: None })
    }
}

fn main() -> ExitCode {
    moyak_lib::init_tracing();

    let cli = Cli::parse();
    let outcome = match cli.into_command() {
        Commands::Serve { bind } => moyak_lib::serve(bind),
        Commands::Identify { image, json } => {
            moyak_lib::identify_file(&image, json).map(|report| println!("{report}"))
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("moyak: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().into_command()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_serves_on_configured_address() {
        assert_eq!(parse(&["moyak"]), Commands::Serve { bind: None });
    }

    #[test]
    fn serve_accepts_bind_override() {
        assert_eq!(
            parse(&["moyak", "serve", "--bind", "127.0.0.1:9000"]),
            Commands::Serve {
                bind: Some("127.0.0.1:9000".parse().unwrap())
            }
        );
        assert!(Cli::try_parse_from(["moyak", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn identify_takes_image_and_json_flag() {
        assert_eq!(
            parse(&["moyak", "identify", "pill.jpg", "--json"]),
            Commands::Identify {
                image: PathBuf::from("pill.jpg"),
                json: true,
            }
        );
        assert!(Cli::try_parse_from(["moyak", "identify"]).is_err());
    }
}
