//! Dungeon layout generator
//!
//! Prints a seeded level as ASCII along with what the generator achieved.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dg_core::dungeon::DungeonRoom;
use dg_core::generator::{AccretionGenerator, MegaDungeonGenerator, RogueGenerator, VaultGenerator};
use dg_core::{
    AccretionConfig, DungeonGenerator, GameRng, GeneratorKind, MegaDungeonConfig, RogueConfig,
    TemplateRules, VaultConfig,
};

/// Roguelike dungeon layout generator
#[derive(Parser, Debug)]
#[command(name = "dungen")]
#[command(author, version, about = "Generate roguelike dungeon layouts", long_about = None)]
struct Args {
    /// Algorithm (accretion, mega, rogue, vault)
    #[arg(short = 'g', long = "generator", default_value_t = GeneratorKind::Accretion)]
    generator: GeneratorKind,

    /// Map width
    #[arg(short = 'W', long = "width", default_value_t = 80)]
    width: i32,

    /// Map height
    #[arg(short = 'H', long = "height", default_value_t = 25)]
    height: i32,

    /// RNG seed, random when omitted
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// JSON file with settings for the chosen generator
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Room count for the accretion generator
    #[arg(short = 'r', long = "rooms")]
    rooms: Option<usize>,

    /// Print map statistics
    #[arg(short = 'i', long = "info")]
    info: bool,

    /// Mark potential stair positions on a second map
    #[arg(long = "stairs")]
    stairs: bool,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}

/// Settings from `path`, or the defaults
fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Plain rectangles of assorted shapes
fn built_in_templates() -> Vec<DungeonRoom> {
    [
        ("closet", 3, 3),
        ("chamber", 5, 5),
        ("hall", 9, 5),
        ("gallery", 3, 9),
        ("den", 5, 3),
        ("great_hall", 11, 7),
    ]
    .into_iter()
    .map(|(name, width, height)| DungeonRoom::rect_template(name, width, height))
    .collect()
}

fn make_generator(args: &Args) -> Result<Box<dyn DungeonGenerator>> {
    let path = args.config.as_deref();
    let generator: Box<dyn DungeonGenerator> = match args.generator {
        GeneratorKind::Accretion => {
            let mut generator = AccretionGenerator::new(
                built_in_templates(),
                load_config::<AccretionConfig>(path)?,
                TemplateRules::default(),
            );
            if let Some(rooms) = args.rooms {
                generator.set_room_count(rooms);
            }
            Box::new(generator)
        }
        GeneratorKind::Mega => Box::new(MegaDungeonGenerator::new(
            load_config::<MegaDungeonConfig>(path)?,
        )),
        GeneratorKind::Rogue => Box::new(RogueGenerator::new(load_config::<RogueConfig>(path)?)),
        GeneratorKind::Vault => Box::new(VaultGenerator::new(load_config::<VaultConfig>(path)?)),
    };
    Ok(generator)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut rng = match args.seed {
        Some(seed) => GameRng::new(seed),
        None => GameRng::from_entropy(),
    };
    let mut generator = make_generator(&args)?;
    info!(generator = %args.generator, seed = rng.seed(), "generating level");

    let result = generator
        .generate(args.width, args.height, &mut rng)
        .with_context(|| format!("{} generator failed", args.generator))?;
    let map = &result.map;

    println!("Seed: {}", rng.seed());
    print!("{map}");
    println!("{}", result.report);
    if result.report.is_shortfall() {
        println!(
            "Note: only {} of {} rooms could be placed",
            result.report.placed_rooms, result.report.requested_rooms
        );
    }

    if args.info {
        for line in map.meta_info() {
            println!("{line}");
        }
    }

    if args.stairs {
        let spots = map.potential_stair_positions();
        println!("Potential stair positions: {}", spots.len());
        print!(
            "{}",
            map.render_with(|p, tile| if spots.contains(&p) { '%' } else { tile.symbol() })
        );
    }

    Ok(())
}
