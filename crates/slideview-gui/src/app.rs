use std::path::{Path, PathBuf};
use std::sync::mpsc;

use slideview_core::config::ViewerConfig;
use slideview_core::session::ViewerSession;
use tracing::{error, info};

use crate::messages::DialogResult;
use crate::panels;
use crate::state::{InputState, UIState, ViewState};

pub struct SlideViewApp {
    pub session: ViewerSession,
    pub view: ViewState,
    pub ui_state: UIState,
    pub input: InputState,
    pub dialog_tx: mpsc::Sender<DialogResult>,
    pub dialog_rx: mpsc::Receiver<DialogResult>,
}

impl SlideViewApp {
    pub fn new(ctx: &egui::Context, initial_file: Option<PathBuf>) -> Self {
        let (dialog_tx, dialog_rx) = mpsc::channel();
        Self {
            session: ViewerSession::new(ViewerConfig::default()),
            view: ViewState::new(ctx),
            ui_state: UIState {
                pending_open: initial_file,
                ..Default::default()
            },
            input: InputState::default(),
            dialog_tx,
            dialog_rx,
        }
    }

    /// Drain all pending dialog results.
    fn poll_dialogs(&mut self) {
        while let Ok(result) = self.dialog_rx.try_recv() {
            match result {
                DialogResult::OpenImage { path } => self.open(&path),
                DialogResult::SaveCrop { path } => self.save_crop(&path),
                DialogResult::ExportTiles { path } => {
                    match self.session.export_highlighted_tiles(&path) {
                        Ok(count) => self
                            .ui_state
                            .add_log(format!("{count} tiles exported to {}", path.display())),
                        Err(e) => self.log_error(e),
                    }
                }
                DialogResult::ImportTiles { path } => {
                    let imported = self
                        .session
                        .set_highlight_mode(&mut self.view, Some(true))
                        .and_then(|_| self.session.import_highlighted_tiles(&mut self.view, &path));
                    match imported {
                        Ok(count) => self
                            .ui_state
                            .add_log(format!("{count} tiles imported from {}", path.display())),
                        Err(e) => self.log_error(e),
                    }
                }
                DialogResult::ConfigImported { config } => self.apply_config(config),
                DialogResult::ConfigExported { path } => self
                    .ui_state
                    .add_log(format!("Config exported to {}", path.display())),
                DialogResult::Error { message } => self.log_error(message),
            }
        }
    }

    pub fn open(&mut self, path: &Path) {
        if self.view.display.is_empty() {
            self.ui_state.pending_open = Some(path.to_path_buf());
            return;
        }
        match self.session.open(path, &mut self.view) {
            Ok(()) => {
                info!(path = %path.display(), "Opened");
                self.ui_state.file_path = Some(path.to_path_buf());
                self.ui_state.crop_selection = None;
                self.input.discard_wheel();
                self.ui_state.add_log(format!("Opened: {}", path.display()));
            }
            Err(e) => self.log_error(e),
        }
    }

    fn save_crop(&mut self, path: &Path) {
        let Some(selection) = self.ui_state.crop_selection else {
            self.ui_state.add_log("No crop selection".into());
            return;
        };
        match self.session.save_crop(&self.view, selection, path) {
            Ok(Some(crop)) => self.ui_state.add_log(format!(
                "Saved {}x{} crop to {}",
                crop.width,
                crop.height,
                path.display()
            )),
            Ok(None) => self.ui_state.add_log("Crop selection is empty".into()),
            Err(e) => self.log_error(e),
        }
    }

    /// Swap in a new config. The open image is reloaded so the pyramid
    /// matches it.
    fn apply_config(&mut self, config: ViewerConfig) {
        if let Err(e) = config.validate() {
            self.log_error(e);
            return;
        }
        let highlight = self.session.highlight_mode();
        self.session = ViewerSession::new(config);
        self.ui_state.add_log("Config imported".into());
        if let Some(path) = self.ui_state.file_path.clone() {
            self.open(&path);
            if highlight {
                if let Err(e) = self.session.set_highlight_mode(&mut self.view, Some(true)) {
                    self.log_error(e);
                }
            }
        }
    }

    pub fn log_error(&mut self, e: impl std::fmt::Display) {
        error!("{e}");
        self.ui_state.add_log(format!("ERROR: {e}"));
    }
}

impl eframe::App for SlideViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_dialogs();

        panels::menu_bar::show(ctx, self);
        panels::status::show(ctx, self);
        panels::viewport::show(ctx, self);

        if let Some(path) = self.ui_state.pending_open.take() {
            self.open(&path);
        }

        if self.ui_state.show_about {
            egui::Window::new("About SlideView")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("SlideView");
                        ui.label("Whole-slide image viewer");
                        ui.add_space(8.0);
                        ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                        ui.add_space(8.0);
                        if ui.button("Close").clicked() {
                            self.ui_state.show_about = false;
                        }
                    });
                });
        }
    }
}
