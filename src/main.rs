//! Shade Evolve CLI - Approximate an image with evolved shaded rectangles.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use shade_evolve::{compute::EvolutionLoop, schema::EvolutionConfig};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <image> [--config <config.json>]", args[0]);
        eprintln!();
        eprintln!("Evolve shaded rectangles that approximate a grayscale version of <image>.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  image        Source image (png, jpeg, gif, bmp)");
        eprintln!("  --config     Optional JSON configuration (see --example)");
        eprintln!();
        eprintln!("Snapshots are written to the output directory (default: out/),");
        eprintln!("which must already exist.");
        std::process::exit(1);
    }

    let image_path = PathBuf::from(&args[1]);
    let config = match args.get(2).map(String::as_str) {
        Some("--config") => {
            let Some(config_path) = args.get(3) else {
                eprintln!("Error: --config requires a path");
                std::process::exit(1);
            };
            load_config(config_path)
        }
        Some(other) => {
            eprintln!("Error: unexpected argument {}", other);
            std::process::exit(1);
        }
        None => EvolutionConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("Error in config: {}", e);
        std::process::exit(1);
    }

    println!("Shade Evolve");
    println!("============");
    println!("Target: {}", image_path.display());
    println!(
        "Population: {} ({} kept), {} genes, rect max {}px, mutation {}",
        config.entity_count,
        config.entity_keep,
        config.gene_count,
        config.rect_max_size,
        config.mutation_factor
    );
    println!("Output: {}", config.output_dir.display());
    println!();
    println!("creating generation 0...");

    let mut evolution = EvolutionLoop::from_image(&config, &image_path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let canvas = evolution.population().evaluator().canvas();
    println!("Canvas: {}x{}", canvas.width, canvas.height);

    let start = Instant::now();
    let result = evolution.run_with_callback(|report| {
        println!("evolving generation {}...", report.generation + 1);
        if report.improved {
            let elapsed = start.elapsed().as_secs_f32();
            println!(
                " ...new optimum found (deviation = {:.6}, mean = {:.1}, {:.1} gen/s)",
                report.best_deviation,
                report.mean_deviation,
                (report.generation + 1) as f32 / elapsed
            );
        }
    });

    let Err(e) = result;
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn load_config(path: &str) -> EvolutionConfig {
    let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    })
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
