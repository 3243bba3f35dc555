// Copyright @yucwang 2026

use photonarray::io::read_grid;
use photonarray::PixelGrid;

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image.exr|image.png> [--srgb]", args[0]);
        std::process::exit(1);
    }
    let srgb = args.iter().skip(2).any(|a| a == "--srgb");

    let grid = read_grid(&args[1], srgb).unwrap_or_else(|e| {
        eprintln!("failed to read {}: {}", args[1], e);
        std::process::exit(1);
    });

    let bounds = grid.bounds();
    let (min, max) = grid.min_max().unwrap_or((0.0, 0.0));
    let mut positive = 0.0f64;
    let mut negative = 0.0f64;
    let mut nonzero = 0usize;
    for iy in bounds.ymin()..=bounds.ymax() {
        for ix in bounds.xmin()..=bounds.xmax() {
            let v = grid.read(ix, iy) as f64;
            if v > 0.0 { positive += v; }
            if v < 0.0 { negative += v; }
            if v != 0.0 { nonzero += 1; }
        }
    }

    println!("Size: {}x{} ({} pixels, {} nonzero)", grid.width(), grid.height(), bounds.area(), nonzero);
    println!("Min: {:.6}", min);
    println!("Max: {:.6}", max);
    println!("Total flux: {:.6} (positive {:.6}, negative {:.6})", positive + negative, positive, negative);
}
