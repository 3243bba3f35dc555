// Copyright 2020 TwoCookingMice

use photonarray::core::config::{ load_config, ShootConfig };
use photonarray::io::exr_utils::write_exr_grid;
use photonarray::io::read_grid;
use photonarray::{ count_pixel_photons, ImageGrid, LcgRng, PhotonArray, PixelGrid };

use indicatif::{ ProgressBar, ProgressStyle };

use std::env;
use std::error::Error;

// Kernel draws use a stream disjoint from the source draws of the same trial.
const KERNEL_SEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <job.xml> [--photons N] [--seed N] [--trials N] [--max-flux F] [--parallel]", args[0]);
        std::process::exit(1);
    }

    let mut config = match load_config(&args[1]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load job {}: {}", args[1], e);
            std::process::exit(1);
        }
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--photons" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    config.photons = v;
                }
            }
            "--seed" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<u64>().ok()) {
                    config.seed = v;
                }
            }
            "--trials" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    config.trials = v.max(1);
                }
            }
            "--max-flux" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<f64>().ok()) {
                    config.max_flux = v;
                }
            }
            "--parallel" => config.parallel = true,
            other => log::warn!("Ignoring unknown argument {}.", other),
        }
        i += 1;
    }

    if let Err(e) = run(&config) {
        eprintln!("photon shooting failed: {}", e);
        std::process::exit(2);
    }
}

fn run(config: &ShootConfig) -> Result<(), Box<dyn Error>> {
    let source = read_grid(&config.source, config.srgb)?;
    let source_flux = source.sum();
    let kernel = match &config.kernel {
        Some(path) => {
            let mut kernel = read_grid(path, config.srgb)?;
            kernel.center_on_origin();
            let kernel_flux = kernel.sum();
            if kernel_flux > 0.0 {
                kernel.scale(1.0 / kernel_flux);
            }
            Some(kernel)
        }
        None => None,
    };

    let mut output = ImageGrid::<f64>::from_bounds(source.bounds());
    let progress = ProgressBar::new(config.trials as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} trials")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut deposited = 0.0;
    for trial in 0..config.trials {
        let seed = config.seed.wrapping_add(trial as u64);
        let mut rng = LcgRng::new(seed);

        let photons = if config.max_flux > 0.0 {
            let mut pa = PhotonArray::new(count_pixel_photons(&source, config.max_flux)?);
            pa.set_from_pixels(&source, config.max_flux, &mut rng)?;
            pa
        } else {
            let mut pa = PhotonArray::new(config.photons);
            if config.parallel {
                pa.set_from_parallel(&source, seed, config.chunk_size)?;
            } else {
                pa.set_from(&source, &mut rng)?;
            }
            pa
        };

        let photons = match &kernel {
            Some(kernel) => {
                let mut spread = PhotonArray::new(photons.size());
                let kernel_seed = seed.wrapping_add(KERNEL_SEED_OFFSET);
                if config.parallel {
                    spread.set_from_parallel(kernel, kernel_seed, config.chunk_size)?;
                    photons.convolve_parallel(&spread)?
                } else {
                    spread.set_from(kernel, &mut LcgRng::new(kernel_seed))?;
                    photons.convolve(&spread)?
                }
            }
            None => photons,
        };

        deposited += if config.parallel {
            photons.add_to_parallel(&mut output, config.chunk_size)?
        } else {
            photons.add_to(&mut output)?
        };
        progress.inc(1);
    }
    progress.finish_and_clear();

    let trials = config.trials.max(1) as f64;
    output.scale(1.0 / trials);
    log::info!("Source flux = {:.6}, mean deposited flux = {:.6}.", source_flux, deposited / trials);

    write_exr_grid(&output, &config.output)?;
    Ok(())
}
