use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use swarmspace_common::{Category, Footprint, SimConfig};
use swarmspace_grid::Simulation;
use swarmspace_kernel::{splitmix64, WorldEvent};

#[derive(Parser)]
#[command(name = "swarmspace-cli", about = "Headless driver for the swarmspace simulation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the default configuration
    Info,
    /// Run a headless simulation and report stats
    Run {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Followers chained behind the player
        #[arg(long, default_value = "8")]
        friends: usize,
        /// Hostile movers scattered over the world
        #[arg(long, default_value = "16")]
        foes: usize,
        /// Static obstacles scattered over the world
        #[arg(long, default_value = "12")]
        walls: usize,
        /// Seed for cell phases and placement
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Delta time passed to every tick
        #[arg(short, long, default_value = "1.0")]
        delta: f32,
        /// Optional JSON config file overriding the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("swarmspace-cli v{}", env!("CARGO_PKG_VERSION"));
            let config = SimConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            ticks,
            friends,
            foes,
            walls,
            seed,
            delta,
            config,
        } => {
            let config = match config {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => SimConfig::default(),
            };
            run(config, ticks, friends, foes, walls, seed, delta)?;
        }
    }

    Ok(())
}

fn run(
    config: SimConfig,
    ticks: u64,
    friends: usize,
    foes: usize,
    walls: usize,
    seed: u64,
    delta: f32,
) -> anyhow::Result<()> {
    let width = config.world_width;
    let height = config.world_height;
    let mut sim = Simulation::with_seed(config, seed)?;

    let player = sim.spawn_mover(
        Category::Player,
        Footprint::new(width / 2.0, height / 2.0, 8.0, 8.0),
    );

    // Followers spawn on the player and chain each to the one before it.
    let mut chain_head = player;
    for _ in 0..friends {
        let friend = sim.spawn_mover(
            Category::Friend,
            Footprint::new(width / 2.0, height / 2.0, 8.0, 8.0),
        );
        let _ = sim.world_mut().set_target(friend, Some(chain_head), false);
        chain_head = friend;
    }

    // Foes and walls scatter deterministically from the seed.
    let mut state = seed;
    let mut scatter = |extent: f32| {
        state = splitmix64(state);
        (state % 10_000) as f32 / 10_000.0 * extent
    };
    for _ in 0..foes {
        let (x, y) = (scatter(width), scatter(height));
        let foe = sim.spawn_mover(Category::Foe, Footprint::new(x, y, 8.0, 8.0));
        let _ = sim.world_mut().set_target(foe, Some(player), false);
    }
    for _ in 0..walls {
        let (x, y) = (scatter(width), scatter(height));
        let _ = sim.spawn_fixture(Category::Static, Footprint::new(x, y, 24.0, 24.0));
    }

    tracing::info!(
        entities = sim.world().entity_count(),
        cells = sim.grid().cell_count(),
        "simulation ready"
    );

    let mut contacts = 0usize;
    for _ in 0..ticks {
        sim.tick(delta);
        contacts += sim
            .world_mut()
            .drain_events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::Contact { .. }))
            .count();
    }

    let stats = sim.grid().stats();
    println!("Ran {ticks} ticks ({} entities)", sim.world().entity_count());
    println!("Contacts recorded: {contacts}");
    println!(
        "Last tick: {} cells updated, {} mover steps, {} membership checks, {} full scans",
        stats.cells_updated, stats.mover_steps, stats.membership_checks, stats.full_scans
    );
    if let Some(entity) = sim.world().get(player) {
        println!(
            "Player at ({:.1}, {:.1})",
            entity.footprint.position.x, entity.footprint.position.y
        );
    }

    Ok(())
}
