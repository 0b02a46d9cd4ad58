//! gpnvm Exerciser
//!
//! Picks a random sample attribute on every iteration and runs
//! get / set / get against the store, logging each outcome.

use std::path::PathBuf;

use clap::Parser;
use gpnvm::{AttrId, AttributeStore, Config};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

const ARRAY_LEN: usize = 10;

/// gpnvm Exerciser
#[derive(Parser, Debug)]
#[command(name = "gpnvm-exercise")]
#[command(about = "Round-trip random attributes through a gpnvm store")]
#[command(version)]
struct Args {
    /// Medium file
    #[arg(short, long, default_value = "nvm.bin")]
    medium: PathBuf,

    /// Number of get/set/get iterations
    #[arg(short, long, default_value = "10")]
    iterations: usize,

    /// RNG seed (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Struct-typed sample attribute, encoded packed
#[derive(Serialize)]
struct SampleStruct {
    id: u8,
    options: u32,
    length: u8,
    data: [u8; ARRAY_LEN],
}

/// Scalars, arrays and a struct of assorted widths, little-endian encoded
fn sample_attributes() -> Result<Vec<Vec<u8>>, bincode::Error> {
    let sample_struct = SampleStruct {
        id: 1,
        options: 2,
        length: 3,
        data: [1; ARRAY_LEN],
    };

    Ok(vec![
        1u8.to_le_bytes().to_vec(),
        2u16.to_le_bytes().to_vec(),
        3u32.to_le_bytes().to_vec(),
        4u64.to_le_bytes().to_vec(),
        [1u8; ARRAY_LEN].to_vec(),
        [2u16; ARRAY_LEN].iter().flat_map(|v| v.to_le_bytes()).collect(),
        [3u32; ARRAY_LEN].iter().flat_map(|v| v.to_le_bytes()).collect(),
        [4u64; ARRAY_LEN].iter().flat_map(|v| v.to_le_bytes()).collect(),
        bincode::serialize(&sample_struct)?,
    ])
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gpnvm=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("gpnvm exerciser v{}", gpnvm::VERSION);
    tracing::info!("Medium: {}", args.medium.display());

    let samples = match sample_attributes() {
        Ok(samples) => samples,
        Err(e) => {
            tracing::error!("Failed to encode sample attributes: {}", e);
            std::process::exit(1);
        }
    };

    let config = Config::builder().medium_path(&args.medium).build();
    let mut store = match AttributeStore::open(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for iteration in 0..args.iterations {
        let index = rng.gen_range(0..samples.len());
        let id = (index + 1) as AttrId;
        let value = &samples[index];

        tracing::info!("Iteration {}: get/set/get attribute {}", iteration, id);

        report_get(&store, id, "before set");

        match store.set_attribute(id, value.len() as u8, value) {
            Ok(()) => tracing::info!("set {} (size {}): {:?}", id, value.len(), value),
            Err(e) => tracing::warn!("set {} failed: {}", id, e),
        }

        report_get(&store, id, "after set");
    }
}

fn report_get(store: &AttributeStore, id: AttrId, stage: &str) {
    match store.get_attribute(id) {
        Ok((length, value)) => tracing::info!("get {} {} (size {}): {:?}", id, stage, length, value),
        Err(e) => tracing::warn!("get {} {} failed: {}", id, stage, e),
    }
}
