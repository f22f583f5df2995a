//! Demo: render a short built-in score to a WAV file
//!
//! Usage: playtune [config.toml] [output.wav]

use playtune::generator::{GeneratorState, SignalGenerator};
use playtune::wav::write_wav_16bit;
use playtune::{Catalog, EngineConfig, Playtune};
use std::env;
use tracing::info;

/// Host block size, in samples
const BLOCK_SIZE: usize = 128;
/// Give up on scores that never stop
const MAX_SECONDS: usize = 60;

/// Three generators: melody (flute), bass (double bass) and percussion
#[rustfmt::skip]
const DEMO_SCORE: &[u8] = &[
    b'P', b't', 6, 0x80 | 0x40 | 0x20, 0x00, 3,
    0xC0, 73,                       // generator 0: flute
    0xC1, 0,                        // generator 1: double bass
    0x90, 72, 100, 0x91, 48, 90, 0x92, 128 + 35, 110, 0x00, 0xFA,
    0x80, 0x90, 76, 100, 0x92, 128 + 42, 70, 0x00, 0xFA,
    0x80, 0x90, 79, 100, 0x92, 128 + 38, 110, 0x00, 0xFA,
    0x80, 0x81, 0x90, 84, 110, 0x91, 43, 90, 0x92, 128 + 42, 70, 0x00, 0xFA,
    0x80, 0x90, 83, 100, 0x92, 128 + 35, 110, 0x00, 0xFA,
    0x80, 0x90, 79, 100, 0x92, 128 + 42, 70, 0x00, 0xFA,
    0x80, 0x90, 74, 100, 0x92, 128 + 38, 110, 0x00, 0xFA,
    0x80, 0x81, 0x90, 72, 110, 0x91, 36, 100, 0x92, 128 + 49, 90, 0x03, 0xE8,
    0x80, 0x81, 0x00, 0x64,
    0xF0,
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let output_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "playtune-demo.wav".to_string());

    println!("Playtune Demo");
    println!("=============");
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Envelope: {}", config.envelope_enabled);
    println!("  Percussion: {}", config.percussion_enabled);
    println!("  Dynamic volume: {}", config.dynamic_volume);
    println!();

    let catalog = Catalog::builtin(config.sample_rate);
    let sample_rate = config.sample_rate;
    let mut engine = Playtune::new(config, &catalog)?;
    engine.play(DEMO_SCORE);
    info!(generators = engine.generator_count(), "demo score started");

    let max_blocks = MAX_SECONDS * sample_rate as usize / BLOCK_SIZE;
    let mut samples = Vec::new();
    let mut block = [0i16; BLOCK_SIZE];
    for _ in 0..max_blocks {
        let state = engine.process(&mut block);
        samples.extend_from_slice(&block);
        if state == GeneratorState::Complete {
            break;
        }
    }

    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    let clipped = samples
        .iter()
        .filter(|&&s| s == i16::MAX || s == i16::MIN)
        .count();
    println!(
        "  Rendered {} samples ({:.2}s)",
        samples.len(),
        samples.len() as f64 / sample_rate as f64
    );
    println!("  Peak: {} ({} clipped samples)", peak, clipped);

    write_wav_16bit(&output_path, &samples, sample_rate)?;
    println!();
    println!("Output: {}", output_path);

    Ok(())
}
