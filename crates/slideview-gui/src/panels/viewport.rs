use std::time::Instant;

use slideview_core::geometry::{DisplayPoint, DisplayRect, DisplaySize};

use crate::app::SlideViewApp;

/// Scroll distance (points) that counts as one wheel notch.
const WHEEL_NOTCH: f32 = 50.0;

pub fn show(ctx: &egui::Context, app: &mut SlideViewApp) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let ppp = ctx.pixels_per_point();
            paint_background(ui, rect);

            let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
            let now = Instant::now();

            track_display_size(app, rect, ppp, now);

            if app.session.is_loaded() {
                handle_wheel(ui, &response, app, rect, ppp, now);
                handle_pan(ui, &response, app, rect, ppp);
                handle_primary(&response, ui, app, rect, ppp);
            }

            flush_debounced(app, now);
            if let Some(wait) = app
                .input
                .resize
                .remaining(now)
                .into_iter()
                .chain(app.input.wheel.remaining(now))
                .min()
            {
                ctx.request_repaint_after(wait);
            }

            match app.view.texture.as_ref().map(|t| t.id()) {
                Some(texture_id) if app.session.is_loaded() => {
                    let offset = pan_preview_offset(ui, app);
                    draw_frame(ui, texture_id, rect, app.view.frame_size, ppp, offset);
                    draw_selection(ui, app, rect, ppp);
                }
                _ => show_placeholder(ui),
            }
        });
}

fn paint_background(ui: &egui::Ui, rect: egui::Rect) {
    ui.painter()
        .rect_filled(rect, 0.0, egui::Color32::from_gray(30));
}

/// Screen position to display pixels relative to the panel's top-left.
fn to_display(pos: egui::Pos2, rect: egui::Rect, ppp: f32) -> DisplayPoint {
    let rel = pos - rect.min;
    DisplayPoint::new((rel.x * ppp) as f64, (rel.y * ppp) as f64)
}

fn track_display_size(app: &mut SlideViewApp, rect: egui::Rect, ppp: f32, now: Instant) {
    let size = DisplaySize::new(
        (rect.width() * ppp).round().max(0.0) as u32,
        (rect.height() * ppp).round().max(0.0) as u32,
    );
    let target = app.input.pending_display.unwrap_or(app.view.display);
    if size == target {
        return;
    }
    // First layout: nothing is on screen yet, apply at once.
    if app.view.display.is_empty() {
        app.view.display = size;
        app.session.refresh(&mut app.view);
        return;
    }
    app.input.pending_display = Some(size);
    app.input.resize.trigger(now);
}

fn handle_wheel(
    ui: &egui::Ui,
    response: &egui::Response,
    app: &mut SlideViewApp,
    rect: egui::Rect,
    ppp: f32,
    now: Instant,
) {
    let scroll = ui.input(|i| i.raw_scroll_delta.y);
    if scroll == 0.0 || !response.hovered() {
        return;
    }
    app.input.wheel_accum += scroll;
    if let Some(pos) = ui.input(|i| i.pointer.hover_pos()) {
        app.input.wheel_pos = Some(to_display(pos, rect, ppp));
    }
    app.input.wheel.trigger(now);
}

fn handle_pan(ui: &egui::Ui, response: &egui::Response, app: &mut SlideViewApp, rect: egui::Rect, ppp: f32) {
    if response.drag_started_by(egui::PointerButton::Secondary)
        || response.drag_started_by(egui::PointerButton::Middle)
    {
        app.input.pan_start = response.interact_pointer_pos();
    }

    let released = response.drag_stopped_by(egui::PointerButton::Secondary)
        || response.drag_stopped_by(egui::PointerButton::Middle);
    if !released {
        return;
    }
    let end = response
        .interact_pointer_pos()
        .or(ui.input(|i| i.pointer.hover_pos()));
    let (Some(start), Some(end)) = (app.input.pan_start.take(), end) else {
        return;
    };
    let movement = DisplayRect::from_points(to_display(start, rect, ppp), to_display(end, rect, ppp));
    app.session.drag(&mut app.view, movement);
}

/// Left button: click toggles a tile in highlight mode, double-click zooms
/// in, drag zooms to the selection (or marks a crop selection in crop mode).
fn handle_primary(
    response: &egui::Response,
    ui: &egui::Ui,
    app: &mut SlideViewApp,
    rect: egui::Rect,
    ppp: f32,
) {
    if response.double_clicked() && !app.session.highlight_mode() {
        if let Some(pos) = response.interact_pointer_pos() {
            let step = app.session.config().zoom.step_factor;
            app.session.zoom_in(&mut app.view, to_display(pos, rect, ppp), step);
        }
        return;
    }

    if response.clicked() && app.session.highlight_mode() {
        if let Some(pos) = response.interact_pointer_pos() {
            if let Err(e) = app
                .session
                .toggle_tile(&mut app.view, to_display(pos, rect, ppp), None)
            {
                app.log_error(e);
            }
        }
        return;
    }

    if response.drag_started_by(egui::PointerButton::Primary) {
        app.input.select_start = response.interact_pointer_pos();
        if app.ui_state.crop_mode {
            app.ui_state.crop_selection = None;
        }
    }

    let Some(start) = app.input.select_start else {
        return;
    };
    let Some(current) = ui.input(|i| i.pointer.hover_pos()).or(response.interact_pointer_pos()) else {
        return;
    };
    let selection = DisplayRect::from_points(to_display(start, rect, ppp), to_display(current, rect, ppp));

    if app.ui_state.crop_mode {
        let min_px = app.session.config().zoom.min_selection_px;
        app.ui_state.crop_selection = (!selection.is_degenerate(min_px)).then_some(selection);
    }

    if response.drag_stopped_by(egui::PointerButton::Primary) {
        app.input.select_start = None;
        if !app.ui_state.crop_mode {
            app.session.select(&mut app.view, selection);
        }
    }
}

/// Apply resize and wheel zoom once their input bursts have settled.
fn flush_debounced(app: &mut SlideViewApp, now: Instant) {
    if app.input.resize.fire(now) {
        if let Some(size) = app.input.pending_display.take() {
            app.view.display = size;
            app.session.resize(&mut app.view);
        }
    }

    if app.input.wheel.fire(now) {
        let notches = (app.input.wheel_accum / WHEEL_NOTCH).round() as i32;
        app.input.wheel_accum = 0.0;
        if let Some(center) = app.input.wheel_pos.take() {
            app.session.zoom_by_notches(&mut app.view, center, notches);
        }
    }
}

/// Offset of the frame while a pan drag is in progress, in screen points.
fn pan_preview_offset(ui: &egui::Ui, app: &SlideViewApp) -> egui::Vec2 {
    match (app.input.pan_start, ui.input(|i| i.pointer.hover_pos())) {
        (Some(start), Some(current)) => current - start,
        _ => egui::Vec2::ZERO,
    }
}

fn draw_frame(
    ui: &egui::Ui,
    texture_id: egui::TextureId,
    rect: egui::Rect,
    frame_size: [usize; 2],
    ppp: f32,
    offset: egui::Vec2,
) {
    let size = egui::vec2(frame_size[0] as f32 / ppp, frame_size[1] as f32 / ppp);
    let img_rect = egui::Rect::from_min_size(rect.min + offset, size);
    ui.painter().with_clip_rect(rect).image(
        texture_id,
        img_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
}

fn draw_selection(ui: &egui::Ui, app: &SlideViewApp, rect: egui::Rect, ppp: f32) {
    let to_screen = |sel: DisplayRect| {
        let sel = sel.normalized();
        egui::Rect::from_min_max(
            rect.min + egui::vec2(sel.x1 as f32 / ppp, sel.y1 as f32 / ppp),
            rect.min + egui::vec2(sel.x2 as f32 / ppp, sel.y2 as f32 / ppp),
        )
    };

    if let Some(sel) = app.ui_state.crop_selection {
        ui.painter().rect_stroke(
            to_screen(sel),
            0.0,
            egui::Stroke::new(1.5, egui::Color32::from_rgb(255, 255, 0)),
            egui::epaint::StrokeKind::Outside,
        );
    }

    if let (Some(start), false) = (app.input.select_start, app.ui_state.crop_mode) {
        if let Some(current) = ui.input(|i| i.pointer.hover_pos()) {
            let sel = egui::Rect::from_two_pos(start, current);
            ui.painter()
                .rect_filled(sel, 0.0, egui::Color32::from_white_alpha(30));
            ui.painter().rect_stroke(
                sel,
                0.0,
                egui::Stroke::new(1.0, egui::Color32::WHITE),
                egui::epaint::StrokeKind::Outside,
            );
        }
    }
}

fn show_placeholder(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.label(
            egui::RichText::new("Open a slide image to begin")
                .size(18.0)
                .color(egui::Color32::from_gray(100)),
        );
    });
}
