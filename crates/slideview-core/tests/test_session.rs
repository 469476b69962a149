mod common;

use slideview_core::error::ViewerError;
use slideview_core::geometry::{DisplayPoint, DisplayRect, DisplaySize};
use slideview_core::io::export::CropRect;
use slideview_core::session::{HeadlessPresenter, ViewerSession};
use slideview_core::viewport::ViewportRect;

fn loaded(display: DisplaySize) -> (ViewerSession, HeadlessPresenter) {
    let mut session = common::tiled_session(50, 200, 100);
    let mut presenter = HeadlessPresenter::new(display);
    session
        .load(common::gradient_source(200, 100), &mut presenter)
        .unwrap();
    (session, presenter)
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn test_empty_session_ignores_gestures() {
    let mut session = ViewerSession::new(common::small_config());
    let mut presenter = HeadlessPresenter::new(DisplaySize::new(800, 600));
    let p = DisplayPoint::new(10.0, 10.0);

    assert!(!session.zoom_in(&mut presenter, p, 2.0));
    assert!(!session.zoom_out(&mut presenter, p, 2.0));
    assert!(!session.drag(&mut presenter, DisplayRect::new(0.0, 0.0, 5.0, 5.0)));
    assert!(!session.select(&mut presenter, DisplayRect::new(0.0, 0.0, 50.0, 50.0)));
    assert!(!session.resize(&mut presenter));
    assert!(session.refresh(&mut presenter).is_none());
    assert_eq!(presenter.frames_shown, 0);
    assert!(session.viewport().is_none());
}

#[test]
fn test_load_shows_full_view() {
    let (session, presenter) = loaded(DisplaySize::new(400, 400));
    assert_eq!(session.viewport(), Some(ViewportRect::full(200, 100)));
    assert_eq!(presenter.frames_shown, 1);

    let frame = presenter.last_frame.as_ref().unwrap();
    assert_eq!((frame.width(), frame.height()), (400, 200));
    assert_eq!(frame.bands(), 3);
    assert!(presenter.last_status.starts_with("Image: 200x100"));
}

#[test]
fn test_status_reports_cache_level() {
    let (session, presenter) = loaded(DisplaySize::new(50, 25));
    assert_eq!(session.pyramid().unwrap().level_count(), 2);
    assert!(
        presenter.last_status.contains("Cache level: 1/2 (50x25)"),
        "got: {}",
        presenter.last_status
    );
}

#[test]
fn test_open_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_gradient_png(dir.path(), "slide.png", 120, 80);

    let mut session = ViewerSession::new(common::small_config());
    let mut presenter = HeadlessPresenter::new(DisplaySize::new(120, 80));
    session.open(&path, &mut presenter).unwrap();

    let source = session.source().unwrap();
    assert_eq!((source.width(), source.height()), (120, 80));
    assert_eq!(source.path(), path.as_path());
    let frame = presenter.last_frame.unwrap();
    assert_eq!(frame.as_bytes(), source.image().as_bytes());
}

#[test]
fn test_open_resets_viewport() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.zoom_in(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0);
    assert_ne!(session.viewport(), Some(ViewportRect::full(200, 100)));

    session
        .load(common::gradient_source(300, 90), &mut presenter)
        .unwrap();
    assert_eq!(session.viewport(), Some(ViewportRect::full(300, 90)));
}

#[test]
fn test_failed_open_keeps_previous_image() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.zoom_in(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0);
    let before = session.viewport();
    let frames = presenter.frames_shown;

    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("not-an-image.png");
    std::fs::write(&bogus, b"definitely not a png").unwrap();

    let err = session.open(&bogus, &mut presenter).unwrap_err();
    assert!(matches!(err, ViewerError::Decode { .. }), "got: {err}");
    assert!(session.open(&dir.path().join("missing.png"), &mut presenter).is_err());

    assert_eq!(session.viewport(), before);
    assert_eq!(session.source().unwrap().width(), 200);
    assert_eq!(presenter.frames_shown, frames);
}

// ---------------------------------------------------------------------------
// Gestures
// ---------------------------------------------------------------------------

#[test]
fn test_zoom_gestures_rerender() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    assert!(session.zoom_in(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0));
    assert_eq!(session.viewport(), Some(ViewportRect::new(50, 25, 150, 75)));
    assert_eq!(presenter.frames_shown, 2);

    assert!(session.zoom_out(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0));
    assert_eq!(session.viewport(), Some(ViewportRect::full(200, 100)));
    assert_eq!(presenter.frames_shown, 3);
}

#[test]
fn test_zoom_by_notches_compounds_steps() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    assert!(!session.zoom_by_notches(&mut presenter, DisplayPoint::new(0.0, 0.0), 0));
    assert!(session.zoom_by_notches(&mut presenter, DisplayPoint::new(0.0, 0.0), 2));
    assert_eq!(session.viewport(), Some(ViewportRect::new(0, 0, 50, 25)));
}

#[test]
fn test_drag_pans_view() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.zoom_in(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0);
    session.drag(&mut presenter, DisplayRect::new(100.0, 50.0, 80.0, 50.0));
    // Dragging left by 20 display px moves the view right by 10 source px.
    assert_eq!(session.viewport(), Some(ViewportRect::new(60, 25, 160, 75)));
}

#[test]
fn test_select_zooms_to_region() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    assert!(session.select(&mut presenter, DisplayRect::new(100.0, 50.0, 200.0, 100.0)));
    assert_eq!(session.viewport(), Some(ViewportRect::new(100, 50, 200, 100)));
    // Too small to count as a selection.
    assert!(!session.select(&mut presenter, DisplayRect::new(0.0, 0.0, 3.0, 3.0)));
}

#[test]
fn test_resize_keeps_scale_and_center() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.zoom_in(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0);
    presenter.display = DisplaySize::new(100, 50);
    assert!(session.resize(&mut presenter));
    assert_eq!(session.viewport(), Some(ViewportRect::new(75, 38, 125, 63)));
}

#[test]
fn test_empty_display_renders_nothing() {
    let mut session = common::tiled_session(50, 200, 100);
    let mut presenter = HeadlessPresenter::new(DisplaySize::new(0, 0));
    session
        .load(common::gradient_source(200, 100), &mut presenter)
        .unwrap();
    assert!(session.is_loaded());
    assert_eq!(presenter.frames_shown, 0);
    assert!(!session.zoom_in(&mut presenter, DisplayPoint::new(0.0, 0.0), 2.0));
}

// ---------------------------------------------------------------------------
// Highlighting
// ---------------------------------------------------------------------------

#[test]
fn test_highlight_requires_initialisation() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    let err = session
        .toggle_tile(&mut presenter, DisplayPoint::new(10.0, 10.0), None)
        .unwrap_err();
    assert!(matches!(err, ViewerError::InvalidState(_)));
    assert!(matches!(
        session.highlighted_tiles(),
        Err(ViewerError::InvalidState(_))
    ));
    assert!(session.clear_highlights(&mut presenter).is_err());
}

#[test]
fn test_toggle_tile_under_pointer() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    assert!(session.set_highlight_mode(&mut presenter, Some(true)).unwrap());
    assert_eq!(session.highlight_grid().unwrap().shape(), (2, 4));

    let p = DisplayPoint::new(75.0, 25.0);
    assert_eq!(session.toggle_tile(&mut presenter, p, None).unwrap(), Some((0, 1)));
    assert_eq!(session.highlighted_tiles().unwrap(), vec![(0, 1)]);

    session.toggle_tile(&mut presenter, p, None).unwrap();
    assert!(session.highlighted_tiles().unwrap().is_empty());
}

#[test]
fn test_toggle_outside_grid_is_ignored() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(400, 100));
    session.set_highlight_mode(&mut presenter, Some(true)).unwrap();
    // Frame is 200 px wide; x = 300 lies past the image.
    let hit = session
        .toggle_tile(&mut presenter, DisplayPoint::new(300.0, 10.0), Some(true))
        .unwrap();
    assert_eq!(hit, None);
    assert!(session.highlighted_tiles().unwrap().is_empty());
}

#[test]
fn test_highlight_mode_toggles_overlay() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    let plain = presenter.last_frame.clone().unwrap();

    assert!(session.set_highlight_mode(&mut presenter, None).unwrap());
    session
        .toggle_tile(&mut presenter, DisplayPoint::new(10.0, 10.0), Some(true))
        .unwrap();
    let overlaid = presenter.last_frame.clone().unwrap();
    assert_ne!(plain.as_bytes(), overlaid.as_bytes());

    assert!(!session.set_highlight_mode(&mut presenter, None).unwrap());
    assert_eq!(presenter.last_frame.unwrap().as_bytes(), plain.as_bytes());
    // Turning the overlay off keeps the selection.
    assert_eq!(session.highlighted_tiles().unwrap(), vec![(0, 0)]);
}

#[test]
fn test_unreadable_tiling_falls_back_to_single_tile() {
    let mut session = ViewerSession::with_tile_reader(
        common::small_config(),
        Box::new(common::FailingTileReader),
    );
    let mut presenter = HeadlessPresenter::new(DisplaySize::new(200, 100));
    session
        .load(common::gradient_source(200, 100), &mut presenter)
        .unwrap();
    session.set_highlight_mode(&mut presenter, Some(true)).unwrap();
    let grid = session.highlight_grid().unwrap();
    assert_eq!(grid.shape(), (1, 1));
    assert!(!grid.layout().tiled);
}

#[test]
fn test_new_image_drops_highlights() {
    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.set_highlight_mode(&mut presenter, Some(true)).unwrap();
    session
        .toggle_tile(&mut presenter, DisplayPoint::new(10.0, 10.0), None)
        .unwrap();
    session
        .load(common::gradient_source(200, 100), &mut presenter)
        .unwrap();
    assert!(session.highlight_mode());
    assert!(session.highlighted_tiles().unwrap().is_empty());
}

#[test]
fn test_tiles_export_and_import() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("tiles.csv");

    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.set_highlight_mode(&mut presenter, Some(true)).unwrap();
    for p in [(10.0, 60.0), (160.0, 10.0)] {
        session
            .toggle_tile(&mut presenter, DisplayPoint::new(p.0, p.1), Some(true))
            .unwrap();
    }
    assert_eq!(session.export_highlighted_tiles(&csv).unwrap(), 2);
    assert_eq!(std::fs::read_to_string(&csv).unwrap(), "0,3\n1,0\n");

    session.clear_highlights(&mut presenter).unwrap();
    assert!(session.highlighted_tiles().unwrap().is_empty());

    std::fs::write(&csv, "0,3\n\n1,0\n9,9\n").unwrap();
    assert_eq!(session.import_highlighted_tiles(&mut presenter, &csv).unwrap(), 2);
    assert_eq!(session.highlighted_tiles().unwrap(), vec![(0, 3), (1, 0)]);
}

// ---------------------------------------------------------------------------
// Crop export
// ---------------------------------------------------------------------------

#[test]
fn test_save_crop_writes_full_resolution_region() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("crop.png");

    // Display at half size so the crop is taken from level-0 pixels.
    let (session, presenter) = loaded(DisplaySize::new(100, 50));
    let crop = session
        .save_crop(&presenter, DisplayRect::new(50.0, 25.0, 0.0, 0.0), &out)
        .unwrap();
    assert_eq!(crop, Some(CropRect { x: 0, y: 0, width: 100, height: 50 }));

    let saved = image::open(&out).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (100, 50));
    assert_eq!(saved.get_pixel(37, 12).0, [37, 12, 64]);
}

#[test]
fn test_save_crop_of_zoomed_view() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("crop.tif");

    let (mut session, mut presenter) = loaded(DisplaySize::new(200, 100));
    session.zoom_in(&mut presenter, DisplayPoint::new(100.0, 50.0), 2.0);
    let crop = session
        .save_crop(&presenter, DisplayRect::new(0.0, 0.0, 100.0, 50.0), &out)
        .unwrap()
        .unwrap();
    assert_eq!(crop, CropRect { x: 50, y: 25, width: 50, height: 25 });

    let saved = image::open(&out).unwrap().to_rgb8();
    assert_eq!(saved.get_pixel(0, 0).0, [50, 25, 64]);
}

#[test]
fn test_save_crop_empty_selection_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("crop.png");
    let (session, presenter) = loaded(DisplaySize::new(200, 100));
    let crop = session
        .save_crop(&presenter, DisplayRect::new(20.0, 20.0, 20.0, 80.0), &out)
        .unwrap();
    assert_eq!(crop, None);
    assert!(!out.exists());
}
