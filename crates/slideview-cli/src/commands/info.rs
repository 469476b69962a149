use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use slideview_core::config::ViewerConfig;
use slideview_core::io::tiling::read_tile_layout;
use slideview_core::pyramid::Pyramid;
use slideview_core::source::SourceImage;

#[derive(Args)]
pub struct InfoArgs {
    /// Input image file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs, config: &ViewerConfig) -> Result<()> {
    let source = SourceImage::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", source.width(), source.height());
    println!("Bands:       {}", source.bands());

    match read_tile_layout(&args.file) {
        Ok(layout) if layout.tiled => {
            let (rows, cols) = layout.grid_shape();
            println!(
                "Tiling:      {}x{} tiles ({} rows x {} cols)",
                layout.tile_width, layout.tile_height, rows, cols
            );
        }
        Ok(_) => println!("Tiling:      none"),
        Err(e) => println!("Tiling:      unavailable ({e})"),
    }

    let pyramid = Pyramid::build(source, &config.pyramid)?;
    println!(
        "Pyramid:     {} levels (factor {})",
        pyramid.level_count(),
        pyramid.factor()
    );
    for (i, (w, h)) in pyramid.level_dimensions().into_iter().enumerate() {
        println!("  level {i}:   {w}x{h}");
    }

    Ok(())
}
