//! Schematic Reader CLI
//!
//! Inspect Litematica schematics and resolve blockstate variants.

use clap::{Parser, Subcommand};
use schematic_reader::{load_schematic, BlockDefinitions, BlockState, StateResolver};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schematic-reader")]
#[command(author, version, about = "Inspect Litematica schematics and resolve blockstate variants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show metadata and regions of a schematic
    Info {
        /// Path to the .litematic file
        file: PathBuf,
    },

    /// List the block palette of every region
    Palette {
        /// Path to the .litematic file
        file: PathBuf,

        /// Only show this region
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Resolve a block state to its model variants
    Resolve {
        /// JSON file mapping block names to blockstate definitions
        #[arg(short, long)]
        definitions: PathBuf,

        /// Block name (e.g., "minecraft:stone" or "stone")
        #[arg(short, long)]
        block: String,

        /// Block properties as key=value pairs (e.g., "facing=north")
        #[arg(short, long, value_parser = parse_property)]
        property: Vec<(String, String)>,

        /// Skip definitions that fail to parse instead of failing
        #[arg(long)]
        lenient: bool,
    },
}

#[derive(Serialize)]
struct RegionSummary<'a> {
    name: &'a str,
    position: [i32; 3],
    size: [i32; 3],
    extent: Option<[i32; 3]>,
    palette_len: usize,
    bits_per_entry: u32,
    non_air_blocks: usize,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("Invalid property format: '{}'. Use key=value", s)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => show_info(&file)?,
        Commands::Palette { file, region } => show_palette(&file, region.as_deref())?,
        Commands::Resolve {
            definitions,
            block,
            property,
            lenient,
        } => resolve(&definitions, &block, property, lenient)?,
    }

    Ok(())
}

fn show_info(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let schematic = load_schematic(path)?;

    println!("Schematic: {:?}", path);
    println!("  Data version: {}", schematic.minecraft_data_version);
    println!("  Format version: {}", schematic.version);
    println!("{}", serde_json::to_string_pretty(&schematic.metadata)?);

    let regions: Vec<_> = schematic
        .regions
        .iter()
        .map(|r| RegionSummary {
            name: &r.name,
            position: r.position.to_array(),
            size: r.size.to_array(),
            extent: r.extent().map(|e| e.to_array()),
            palette_len: r.palette.len(),
            bits_per_entry: r.bits_per_entry(),
            non_air_blocks: r.non_air_count(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&regions)?);

    let volume = schematic
        .volume()
        .map_or_else(|| "overflowing".to_string(), |v| v.to_string());
    println!(
        "Total: {} voxels, {} non-air",
        volume,
        schematic.non_air_count()
    );

    Ok(())
}

fn show_palette(path: &PathBuf, only: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let schematic = load_schematic(path)?;

    let regions: Vec<_> = match only {
        Some(name) => match schematic.region(name) {
            Some(region) => vec![region],
            None => return Err(format!("No region named '{}'", name).into()),
        },
        None => schematic.regions.iter().collect(),
    };

    for region in regions {
        println!("Region '{}' ({} entries):", region.name, region.palette.len());
        for (i, state) in region.palette.iter().enumerate() {
            println!("  {:>4}: {}", i, state);
        }
    }

    Ok(())
}

fn resolve(
    definitions_path: &PathBuf,
    block_name: &str,
    properties: Vec<(String, String)>,
    lenient: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = fs::read_to_string(definitions_path)?;
    let definitions = if lenient {
        BlockDefinitions::from_json_lenient(&json)?
    } else {
        BlockDefinitions::from_json(&json)?
    };
    log::info!("Loaded {} block definitions", definitions.len());

    let block = properties
        .into_iter()
        .fold(BlockState::new(block_name), |b, (k, v)| b.with_property(k, v));

    let resolver = StateResolver::new(&definitions);
    let variants = resolver.resolve(&block, &mut rand::thread_rng())?;

    println!("{} -> {} variant(s)", block, variants.len());
    println!("{}", serde_json::to_string_pretty(&variants)?);

    Ok(())
}
