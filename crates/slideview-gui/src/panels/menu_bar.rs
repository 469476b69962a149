use slideview_core::config::ViewerConfig;
use slideview_core::viewport::ViewportRect;

use crate::app::SlideViewApp;
use crate::messages::DialogResult;

const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "svs", "png", "jpg", "jpeg"];

pub fn show(ctx: &egui::Context, app: &mut SlideViewApp) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                let open_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::O);
                if ui.add(egui::Button::new("Open...").shortcut_text(ctx.format_shortcut(&open_shortcut))).clicked() {
                    ui.close();
                    open_file(app);
                }

                let has_crop = app.ui_state.crop_selection.is_some();
                let save_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
                if ui
                    .add_enabled(
                        has_crop,
                        egui::Button::new("Save Crop...").shortcut_text(ctx.format_shortcut(&save_shortcut)),
                    )
                    .clicked()
                {
                    ui.close();
                    save_crop(app);
                }

                ui.separator();

                let has_grid = app.session.highlight_grid().is_some();
                if ui.add_enabled(app.session.is_loaded(), egui::Button::new("Import Tiles...")).clicked() {
                    ui.close();
                    pick_tiles_file(app);
                }
                if ui.add_enabled(has_grid, egui::Button::new("Export Tiles...")).clicked() {
                    ui.close();
                    export_tiles(app);
                }

                ui.separator();

                if ui.button("Import Config...").clicked() {
                    ui.close();
                    import_config(app);
                }
                if ui.button("Export Config...").clicked() {
                    ui.close();
                    export_config(app);
                }

                ui.separator();

                let quit_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q);
                if ui.add(egui::Button::new("Quit").shortcut_text(ctx.format_shortcut(&quit_shortcut))).clicked() {
                    ui.close();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                let mut highlight = app.session.highlight_mode();
                if ui.checkbox(&mut highlight, "Highlight Tiles").changed() {
                    set_highlight(app, highlight);
                }
                if ui.checkbox(&mut app.ui_state.crop_mode, "Crop Selection").changed()
                    && !app.ui_state.crop_mode
                {
                    app.ui_state.crop_selection = None;
                }

                ui.separator();

                if ui.add_enabled(app.session.highlight_grid().is_some(), egui::Button::new("Clear Highlights")).clicked() {
                    ui.close();
                    if let Err(e) = app.session.clear_highlights(&mut app.view) {
                        app.log_error(e);
                    }
                }
                if ui.add_enabled(app.session.is_loaded(), egui::Button::new("Reset View")).clicked() {
                    ui.close();
                    reset_view(app);
                }
            });

            ui.menu_button("Help", |ui| {
                if ui.button("About").clicked() {
                    ui.close();
                    app.ui_state.show_about = true;
                }
            });
        });

        // Keyboard shortcuts (consumed outside menus)
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::O))) {
            open_file(app);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S)))
            && app.ui_state.crop_selection.is_some()
        {
            save_crop(app);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q))) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::NONE, egui::Key::H))) {
            let enabled = !app.session.highlight_mode();
            set_highlight(app, enabled);
        }
    });
}

fn set_highlight(app: &mut SlideViewApp, enabled: bool) {
    match app.session.set_highlight_mode(&mut app.view, Some(enabled)) {
        Ok(on) => {
            if let Some(grid) = app.session.highlight_grid().filter(|_| on) {
                let (rows, cols) = grid.shape();
                app.ui_state.add_log(format!("Highlighting on ({rows}x{cols} tiles)"));
            }
        }
        Err(e) => app.log_error(e),
    }
}

fn reset_view(app: &mut SlideViewApp) {
    if let Some(source) = app.session.source() {
        let full = ViewportRect::full(source.width(), source.height());
        app.session.set_viewport(&mut app.view, full);
    }
}

fn open_file(app: &mut SlideViewApp) {
    let tx = app.dialog_tx.clone();
    std::thread::spawn(move || {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Slide images", IMAGE_EXTENSIONS)
            .add_filter("All files", &["*"])
            .pick_file()
        {
            let _ = tx.send(DialogResult::OpenImage { path });
        }
    });
}

fn save_crop(app: &mut SlideViewApp) {
    let tx = app.dialog_tx.clone();
    std::thread::spawn(move || {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("TIFF", &["tiff", "tif"])
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .set_file_name("crop.tiff")
            .save_file()
        {
            let _ = tx.send(DialogResult::SaveCrop { path });
        }
    });
}

fn pick_tiles_file(app: &mut SlideViewApp) {
    let tx = app.dialog_tx.clone();
    std::thread::spawn(move || {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv", "txt"])
            .pick_file()
        {
            let _ = tx.send(DialogResult::ImportTiles { path });
        }
    });
}

fn export_tiles(app: &mut SlideViewApp) {
    let tx = app.dialog_tx.clone();
    std::thread::spawn(move || {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name("tiles.csv")
            .save_file()
        {
            let _ = tx.send(DialogResult::ExportTiles { path });
        }
    });
}

fn import_config(app: &mut SlideViewApp) {
    let tx = app.dialog_tx.clone();
    std::thread::spawn(move || {
        let Some(path) = rfd::FileDialog::new().add_filter("TOML", &["toml"]).pick_file() else {
            return;
        };
        let result = match ViewerConfig::load(&path) {
            Ok(config) => DialogResult::ConfigImported { config },
            Err(e) => DialogResult::Error {
                message: format!("Config import failed: {e}"),
            },
        };
        let _ = tx.send(result);
    });
}

fn export_config(app: &mut SlideViewApp) {
    let config = app.session.config().clone();
    let tx = app.dialog_tx.clone();
    std::thread::spawn(move || {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("TOML", &["toml"])
            .set_file_name("slideview.toml")
            .save_file()
        else {
            return;
        };
        let result = match config.save(&path) {
            Ok(()) => DialogResult::ConfigExported { path },
            Err(e) => DialogResult::Error {
                message: format!("Config export to {} failed: {e}", path.display()),
            },
        };
        let _ = tx.send(result);
    });
}
