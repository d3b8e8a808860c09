mod config;

use clap::{Parser, Subcommand};
use compute::{AnimationFrame, clusters_for_view, trajectories};
use foundation::{BalloonId, WebMercator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use runtime::{
    AnimationEvent, GameConfig, GameSession, GridPanoramaProvider, PanoramaSearch, Sequencer,
    TrackerSession, find_playable_location, landing_view, random_location,
};
use scene::{Registry, seed_balloons};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::TrackerConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weather balloon tracker")]
struct Args {
    /// RNG seed for the simulated fleet (env: TRACKER_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of balloons to launch (env: TRACKER_BALLOONS)
    #[arg(long)]
    balloons: Option<usize>,

    /// Delay between descent frames in milliseconds (env: TRACKER_FRAME_MS)
    #[arg(long)]
    frame_ms: Option<u64>,

    /// Cluster merge distance in pixels (env: TRACKER_CLUSTER_PX)
    #[arg(long)]
    threshold: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fleet with projected landing points
    Balloons,

    /// Print the marker clusters for a zoom level
    Clusters {
        #[arg(long, default_value_t = 4.0, value_parser = parse_zoom)]
        zoom: f64,
    },

    /// Pop a balloon and stream its descent as JSON lines
    Pop {
        /// Balloon id, e.g. balloon-3
        id: String,

        /// Skip the street-level lookup at the landing site
        #[arg(long)]
        no_panorama: bool,
    },

    /// Play the location guessing game with random guesses
    Game {
        #[arg(long, default_value_t = 5)]
        rounds: u32,
    },
}

impl Args {
    fn config(&self) -> TrackerConfig {
        let mut config = TrackerConfig::from_env();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(balloons) = self.balloons {
            config.balloons = balloons;
        }
        if let Some(frame_ms) = self.frame_ms {
            config.frame_ms = frame_ms;
        }
        if let Some(threshold) = self.threshold {
            config.cluster_threshold_px = threshold;
        }
        config
    }
}

fn parse_zoom(s: &str) -> Result<f64, String> {
    let zoom: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !zoom.is_finite() || zoom < 0.0 {
        return Err(format!("zoom must be a finite, non-negative number (got {s})"));
    }
    Ok(zoom)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();
    info!(?config, "tracker starting");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let registry = Registry::with_balloons(seed_balloons(&mut rng, config.balloons))?;

    match args.command {
        Command::Balloons => print_balloons(&registry)?,
        Command::Clusters { zoom } => {
            let clusters = clusters_for_view(
                registry.balloons(),
                &WebMercator,
                config.cluster_threshold_px,
                zoom,
            );
            info!(zoom, clusters = clusters.len(), "clusters built");
            print_json(&clusters)?;
        }
        Command::Pop { id, no_panorama } => {
            pop(registry, &config, BalloonId::new(id), !no_panorama).await?
        }
        Command::Game { rounds } => play(&mut rng, rounds).await?,
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_balloons(registry: &Registry) -> Result<(), serde_json::Error> {
    #[derive(Serialize)]
    struct Row<'a> {
        balloon: &'a scene::Balloon,
        trajectory: compute::Trajectory,
    }

    let balloons = registry.balloons();
    for (balloon, trajectory) in balloons.iter().zip(trajectories(balloons)) {
        print_json(&Row {
            balloon,
            trajectory,
        })?;
    }
    Ok(())
}

async fn pop(
    registry: Registry,
    config: &TrackerConfig,
    id: BalloonId,
    with_panorama: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let heading = registry
        .get(&id)
        .map(|b| b.direction)
        .ok_or_else(|| format!("unknown balloon {id}"))?;

    let mut session = TrackerSession::new(registry, Sequencer::new(config.descent()));
    session.select(Some(id.clone()))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    session
        .pop(&id, move |event: AnimationEvent| {
            // The receiver only goes away on shutdown.
            let _ = tx.send(event);
        })
        .await?;

    let mut landing: Option<AnimationFrame> = None;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                print_json(&event)?;
                if let AnimationEvent::Frame { frame, .. } = event {
                    if frame.is_final() {
                        landing = Some(frame);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling descent");
                session.cancel().await?;
            }
        }
    }
    session.wait().await?;

    if let (Some(frame), true) = (landing, with_panorama) {
        let provider = GridPanoramaProvider::default();
        match landing_view(&provider, &frame, heading, PanoramaSearch::default()).await {
            Some(view) => print_json(&view)?,
            None => info!(balloon = %id, "no street-level imagery near landing site"),
        }
    }
    Ok(())
}

async fn play(rng: &mut StdRng, rounds: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = GameConfig {
        rounds: rounds.max(1),
        ..GameConfig::default()
    };
    let provider = GridPanoramaProvider::default();
    let mut game = GameSession::new(config);

    loop {
        let target = find_playable_location(&provider, rng, &config)
            .await
            .ok_or("no playable location found")?;
        game.set_target(target)?;

        let guess = random_location(rng, config.lat_limit);
        print_json(&game.submit_guess(guess)?)?;

        if game.is_finished() {
            break;
        }
        game.next_round()?;
    }

    info!(score = game.score(), rounds = game.round(), "game over");
    println!("{}", serde_json::json!({ "score": game.score() }));
    Ok(())
}
