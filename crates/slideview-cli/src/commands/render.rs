use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use slideview_core::config::ViewerConfig;
use slideview_core::geometry::{DisplayPoint, DisplayRect, DisplaySize};
use slideview_core::io::export::save_image;
use slideview_core::session::{HeadlessPresenter, ViewerSession};
use tracing::info;

#[derive(Args)]
pub struct RenderArgs {
    /// Input image file
    pub file: PathBuf,

    /// Display area size (WxH)
    #[arg(long, default_value = "800x600", value_parser = parse_size)]
    pub size: DisplaySize,

    /// Gesture to replay, in order (repeatable). One of zoom-in:X,Y,
    /// zoom-out:X,Y, wheel:X,Y,NOTCHES, drag:X1,Y1,X2,Y2, select:X1,Y1,X2,Y2,
    /// resize:WxH, highlight:on|off|toggle, tile:X,Y
    #[arg(short, long = "gesture")]
    pub gestures: Vec<Gesture>,

    /// Highlighted tiles to load before replaying gestures (row,col lines)
    #[arg(long)]
    pub tiles_in: Option<PathBuf>,

    /// Write the highlighted tiles after replaying gestures
    #[arg(long)]
    pub tiles_out: Option<PathBuf>,

    /// Export the full-resolution pixels under a selection (X1,Y1,X2,Y2:PATH)
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropRequest>,

    /// Output file for the final frame
    #[arg(short, long, default_value = "frame.png")]
    pub output: PathBuf,
}

/// One coalesced user gesture, in display coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    ZoomIn(DisplayPoint),
    ZoomOut(DisplayPoint),
    Wheel(DisplayPoint, i32),
    Drag(DisplayRect),
    Select(DisplayRect),
    Resize(DisplaySize),
    Highlight(Option<bool>),
    Tile(DisplayPoint),
}

impl FromStr for Gesture {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("expected KIND:ARGS, got '{s}'"))?;
        match kind {
            "zoom-in" => Ok(Gesture::ZoomIn(parse_point(rest)?)),
            "zoom-out" => Ok(Gesture::ZoomOut(parse_point(rest)?)),
            "wheel" => {
                let v = parse_numbers(rest, 3)?;
                if v[2].fract() != 0.0 {
                    return Err(format!("notches must be an integer, got '{}'", v[2]));
                }
                Ok(Gesture::Wheel(DisplayPoint::new(v[0], v[1]), v[2] as i32))
            }
            "drag" => Ok(Gesture::Drag(parse_rect(rest)?)),
            "select" => Ok(Gesture::Select(parse_rect(rest)?)),
            "resize" => Ok(Gesture::Resize(parse_size(rest)?)),
            "highlight" => match rest {
                "on" => Ok(Gesture::Highlight(Some(true))),
                "off" => Ok(Gesture::Highlight(Some(false))),
                "toggle" => Ok(Gesture::Highlight(None)),
                other => Err(format!("highlight expects on|off|toggle, got '{other}'")),
            },
            "tile" => Ok(Gesture::Tile(parse_point(rest)?)),
            other => Err(format!("unknown gesture '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CropRequest {
    pub selection: DisplayRect,
    pub path: PathBuf,
}

fn parse_numbers(s: &str, count: usize) -> std::result::Result<Vec<f64>, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in '{s}': {e}"))?;
    if values.len() != count {
        return Err(format!("expected {count} values, got '{s}'"));
    }
    Ok(values)
}

fn parse_point(s: &str) -> std::result::Result<DisplayPoint, String> {
    let v = parse_numbers(s, 2)?;
    Ok(DisplayPoint::new(v[0], v[1]))
}

fn parse_rect(s: &str) -> std::result::Result<DisplayRect, String> {
    let v = parse_numbers(s, 4)?;
    Ok(DisplayRect::new(v[0], v[1], v[2], v[3]))
}

fn parse_size(s: &str) -> std::result::Result<DisplaySize, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid size '{s}': {e}"))
    };
    Ok(DisplaySize::new(parse(w)?, parse(h)?))
}

fn parse_crop(s: &str) -> std::result::Result<CropRequest, String> {
    let (rect, path) = s
        .split_once(':')
        .ok_or_else(|| format!("expected X1,Y1,X2,Y2:PATH, got '{s}'"))?;
    if path.is_empty() {
        return Err("crop output path is empty".into());
    }
    Ok(CropRequest {
        selection: parse_rect(rect)?,
        path: PathBuf::from(path),
    })
}

pub fn run(args: &RenderArgs, config: &ViewerConfig) -> Result<()> {
    if args.size.is_empty() {
        bail!("Display size must be non-zero, got {}", args.size);
    }

    let mut presenter = HeadlessPresenter::new(args.size);
    let mut session = ViewerSession::new(config.clone());
    session
        .open(&args.file, &mut presenter)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    println!("{}", presenter.last_status);

    if let Some(ref path) = args.tiles_in {
        session.set_highlight_mode(&mut presenter, Some(true))?;
        let applied = session
            .import_highlighted_tiles(&mut presenter, path)
            .with_context(|| format!("Failed to import tiles from {}", path.display()))?;
        println!("Imported {applied} highlighted tiles");
    }

    let step = config.zoom.step_factor;
    for gesture in &args.gestures {
        info!(?gesture, "Replaying gesture");
        let changed = match *gesture {
            Gesture::ZoomIn(p) => session.zoom_in(&mut presenter, p, step),
            Gesture::ZoomOut(p) => session.zoom_out(&mut presenter, p, step),
            Gesture::Wheel(p, notches) => session.zoom_by_notches(&mut presenter, p, notches),
            Gesture::Drag(movement) => session.drag(&mut presenter, movement),
            Gesture::Select(selection) => session.select(&mut presenter, selection),
            Gesture::Resize(size) => {
                presenter.display = size;
                session.resize(&mut presenter)
            }
            Gesture::Highlight(mode) => {
                session.set_highlight_mode(&mut presenter, mode)?;
                true
            }
            Gesture::Tile(p) => session.toggle_tile(&mut presenter, p, None)?.is_some(),
        };
        if changed {
            println!("{}", presenter.last_status);
        }
    }

    if let Some(ref crop) = args.crop {
        match session.save_crop(&presenter, crop.selection, &crop.path)? {
            Some(rect) => println!(
                "Crop {}x{} at ({}, {}) saved to {}",
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                crop.path.display()
            ),
            None => println!("Crop selection is empty, nothing saved"),
        }
    }

    if let Some(ref path) = args.tiles_out {
        let count = session.export_highlighted_tiles(path)?;
        println!("{count} highlighted tiles written to {}", path.display());
    }

    let frame = presenter
        .last_frame
        .as_ref()
        .context("No frame was rendered")?;
    save_image(frame.image(), &args.output)
        .with_context(|| format!("Failed to save {}", args.output.display()))?;
    println!(
        "Frame {}x{} saved to {}",
        frame.width(),
        frame.height(),
        args.output.display()
    );

    Ok(())
}
