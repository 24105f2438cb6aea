use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ventusky",
    version,
    about = "Ventusky forecast scraper, viewer and refresh service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the forecast page for a position
    Fetch {
        #[arg(long, default_value_t = 48.941, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, default_value_t = 2.159, allow_hyphen_values = true)]
        lon: f64,
        /// Output file
        #[arg(short, long, default_value = "test.html")]
        output: PathBuf,
    },
    /// Convert a saved page into canonical forecast JSON
    Parse {
        /// Saved HTML page
        #[arg(default_value = "test.html")]
        input: PathBuf,
        /// Destination JSON file
        #[arg(default_value = "weather.json")]
        output: PathBuf,
        /// Display name; defaults to the place named in the page title
        #[arg(short, long)]
        location: Option<String>,
    },
    /// Print a forecast JSON file in human-readable form
    Read {
        #[arg(default_value = "weather.json")]
        file: PathBuf,
        /// Only this date, e.g. 2026/02/25
        #[arg(long)]
        day: Option<String>,
        /// Only one slot field, e.g. temperature_c
        #[arg(long)]
        field: Option<String>,
    },
    /// Keep every configured location refreshed until Ctrl-C
    Watch,
    /// Re-run interactive setup
    Init,
    /// Validate config and test connections
    Check,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_defaults() {
        let cli = Cli::parse_from(["ventusky", "fetch"]);
        match cli.command {
            Commands::Fetch { lat, lon, output } => {
                assert_eq!(lat, 48.941);
                assert_eq!(lon, 2.159);
                assert_eq!(output, PathBuf::from("test.html"));
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn negative_coordinates_and_verbosity() {
        let cli = Cli::parse_from(["ventusky", "-vv", "fetch", "--lat", "-33.9", "--lon", "-70.6"]);
        assert_eq!(cli.log_filter(), "trace");
        match cli.command {
            Commands::Fetch { lat, lon, .. } => {
                assert_eq!(lat, -33.9);
                assert_eq!(lon, -70.6);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn read_filters() {
        let cli = Cli::parse_from([
            "ventusky",
            "read",
            "out.json",
            "--day",
            "2026/02/25",
            "--field",
            "temperature_c",
        ]);
        match cli.command {
            Commands::Read { file, day, field } => {
                assert_eq!(file, PathBuf::from("out.json"));
                assert_eq!(day.as_deref(), Some("2026/02/25"));
                assert_eq!(field.as_deref(), Some("temperature_c"));
            }
            _ => panic!("expected read"),
        }
        assert_eq!(Cli::parse_from(["ventusky", "watch"]).log_filter(), "warn");
    }
}
