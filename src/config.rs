use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_API_BASE_URL: &str = "https://wamp-limjiannn.pythonanywhere.com";
pub const DEFAULT_WORLD_TOPOLOGY: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";
pub const DEFAULT_US_TOPOLOGY: &str = "https://cdn.jsdelivr.net/npm/us-atlas@3/states-10m.json";

const APP_DIR: &str = "geo-explorer";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "geo-explorer",
    version,
    about = "Explore which countries, states and cities are in the geo database"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the geo REST API
    #[arg(long, global = true, env = "GEO_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// World countries TopoJSON (URL or local file)
    #[arg(long, env = "GEO_WORLD_TOPOLOGY", default_value = DEFAULT_WORLD_TOPOLOGY)]
    pub world_topology: String,

    /// US states TopoJSON (URL or local file)
    #[arg(long, env = "GEO_US_TOPOLOGY", default_value = DEFAULT_US_TOPOLOGY)]
    pub us_topology: String,

    /// Where the auth token is kept between runs
    #[arg(long, env = "GEO_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, global = true, env = "GEO_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Per-request timeout in seconds; unset means no timeout
    #[arg(long, global = true, env = "GEO_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Bulk-load countries, states and cities from a JSON file, then exit
    Seed(SeedArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    /// JSON object with `countries`, `states` and `cities` arrays
    #[arg(long, default_value = "seed_geo.json")]
    pub file: PathBuf,

    /// Sent as X-API-KEY on every bulk request
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_file
            .clone()
            .unwrap_or_else(|| app_dir(dirs::data_dir()).join("token"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| app_dir(dirs::cache_dir()).join("geo-explorer.log"))
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(std::env::temp_dir).join(APP_DIR)
}
