use clap::{Parser, Subcommand};

use crate::domain::Sport;

#[derive(Parser, Debug)]
#[command(author, version, about = "Free tennis and padel court slots across Moscow booking platforms")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Fetch free slots from every configured venue and save one document per sport
    Fetch {
        /// Only this sport (defaults to all)
        #[arg(short, long, value_enum)]
        sport: Option<Sport>,
    },
    /// Print a saved document
    Show {
        #[arg(short, long, value_enum)]
        sport: Sport,
        /// Only this venue id
        #[arg(short, long)]
        venue: Option<String>,
    },
    /// Match free text against venue names
    Resolve {
        text: String,
        /// Print the best candidates with their scores
        #[arg(short, long)]
        debug: bool,
        /// Minimum similarity for a match (defaults to 0.25)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Start the read API server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_sport_is_optional() {
        let cli = Cli::try_parse_from(["court_slots", "fetch"]).unwrap();
        assert_eq!(cli.command, Command::Fetch { sport: None });

        let cli = Cli::try_parse_from(["court_slots", "fetch", "--sport", "padel"]).unwrap();
        assert_eq!(cli.command, Command::Fetch { sport: Some(Sport::Padel) });
    }

    #[test]
    fn test_resolve_arguments() {
        let cli = Cli::try_parse_from(["court_slots", "resolve", "ТК Олимп", "--debug", "-t", "0.4"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Resolve {
                text: "ТК Олимп".to_string(),
                debug: true,
                threshold: Some(0.4),
            }
        );
    }

    #[test]
    fn test_serve_default_port() {
        let cli = Cli::try_parse_from(["court_slots", "serve"]).unwrap();
        assert_eq!(cli.command, Command::Serve { port: 3000 });
        assert!(Cli::try_parse_from(["court_slots", "show"]).is_err());
    }
}
