//! FDTD Video CLI - Render a run of field frames from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use fdtd_video::{RunOutcome, VideoConfig, render_with_ffmpeg};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 {
        eprintln!("Usage: {} [config.json]", args[0]);
        eprintln!();
        eprintln!("Render FDTD field frames into a video.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to rendering configuration (default: built-in)");
        eprintln!();
        eprintln!("Example configuration is printed with --example.");
        std::process::exit(1);
    }

    if args.get(1).is_some_and(|a| a == "--example") {
        print_example_config();
        return;
    }

    let config = match args.get(1) {
        Some(path) => load_config(PathBuf::from(path)),
        None => VideoConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("Error in config: {}", e);
        std::process::exit(1);
    }

    println!("FDTD Video");
    println!("==========");
    println!(
        "Input: {}/{} (N = {})",
        config.input.dir.display(),
        config.input.pattern,
        config.input.cells
    );
    println!(
        "Output: {} ({}, {} fps)",
        config.encoder.output.display(),
        config.encoder.codec,
        config.encoder.fps
    );
    println!();

    let start = Instant::now();
    match render_with_ffmpeg(&config) {
        Ok(RunOutcome::Encoded(stats)) => {
            println!("Encoded {}", stats);
            println!("Time: {:.2}s", start.elapsed().as_secs_f32());
        }
        Ok(RunOutcome::NoFrames) => {
            println!("Warning: no frames found; no video written.");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: PathBuf) -> VideoConfig {
    let config_str = fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn print_example_config() {
    let config = VideoConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            std::process::exit(1);
        }
    }
}
