use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use get2wurk::api::RecommendResponse;
use get2wurk::models::Departure;
use get2wurk::{Coordinate, Get2WurkConfig, Preferences, RecommendationService, TripRequest};

/// GET2WURK - bike or transit commute recommendations
#[derive(Debug, Parser)]
#[command(name = "get2wurk", version, about)]
struct Cli {
    /// Configuration file (defaults to ./get2wurk.toml when present)
    #[arg(long, global = true, env = "GET2WURK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print one recommendation as JSON
    Recommend(RecommendArgs),
}

#[derive(Debug, Args)]
struct RecommendArgs {
    /// Origin as LAT,LON
    #[arg(long, allow_hyphen_values = true)]
    origin: Coordinate,

    /// Destination as LAT,LON
    #[arg(long, allow_hyphen_values = true)]
    destination: Coordinate,

    /// Departure time: RFC 3339, or local time without an offset
    #[arg(long)]
    depart_at: Option<Departure>,

    #[arg(long)]
    no_bike: bool,

    #[arg(long)]
    no_transit: bool,

    /// Destination station to prefer, matched by name
    #[arg(long)]
    preferred_station: Option<String>,
}

impl RecommendArgs {
    fn into_trip(self) -> TripRequest {
        let prefs = Preferences {
            bike_allowed: !self.no_bike,
            transit_allowed: !self.no_transit,
            preferred_dest_station_name: self.preferred_station,
            ..Preferences::default()
        };
        TripRequest::new(self.origin, self.destination)
            .depart_at(self.depart_at)
            .with_prefs(prefs)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Get2WurkConfig::load_from_path(cli.config)?;
    get2wurk::logging::init(&config.logging)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!("Starting GET2WURK {}", get2wurk::VERSION);
            get2wurk::web::run(&config).await
        }
        Command::Recommend(args) => {
            let service = RecommendationService::from_config(&config)?;
            let result = service
                .recommend(args.into_trip())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let output = serde_json::to_string_pretty(&RecommendResponse::from(result))
                .context("Failed to serialize recommendation")?;
            println!("{output}");
            Ok(())
        }
    }
}
