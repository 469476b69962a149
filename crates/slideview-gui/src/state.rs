use std::path::PathBuf;

use slideview_core::geometry::{DisplayPoint, DisplayRect, DisplaySize};
use slideview_core::render::DisplayFrame;
use slideview_core::session::Presenter;

use crate::convert::frame_to_color_image;
use crate::debounce::Debouncer;

/// What the core last handed to the presentation layer.
pub struct ViewState {
    ctx: egui::Context,
    pub texture: Option<egui::TextureHandle>,
    /// Frame size in physical pixels.
    pub frame_size: [usize; 2],
    /// Display area in physical pixels, as last reported to the core.
    pub display: DisplaySize,
    pub status: String,
}

impl ViewState {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            ctx: ctx.clone(),
            texture: None,
            frame_size: [0, 0],
            display: DisplaySize::default(),
            status: String::new(),
        }
    }
}

impl Presenter for ViewState {
    fn display_area_size(&self) -> DisplaySize {
        self.display
    }

    fn show_image(&mut self, frame: &DisplayFrame) {
        let image = frame_to_color_image(frame);
        self.frame_size = image.size;
        match self.texture {
            Some(ref mut texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(self.ctx.load_texture(
                    "viewport",
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }
    }

    fn show_statistics(&mut self, text: &str) {
        self.status = text.to_string();
    }
}

/// Overall UI state.
#[derive(Default)]
pub struct UIState {
    pub file_path: Option<PathBuf>,
    /// Opened once the display area has been laid out.
    pub pending_open: Option<PathBuf>,

    /// Left drag marks a crop selection instead of zooming.
    pub crop_mode: bool,
    pub crop_selection: Option<DisplayRect>,

    pub log_messages: Vec<String>,
    pub show_about: bool,
}

impl UIState {
    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }
}

/// Pointer gestures in progress. Positions are screen points.
#[derive(Default)]
pub struct InputState {
    pub select_start: Option<egui::Pos2>,
    pub pan_start: Option<egui::Pos2>,

    /// Scroll distance accumulated since the last applied zoom.
    pub wheel_accum: f32,
    /// Pointer position of the latest wheel event, in display pixels.
    pub wheel_pos: Option<DisplayPoint>,
    pub wheel: Debouncer,

    /// Display size waiting to be applied.
    pub pending_display: Option<DisplaySize>,
    pub resize: Debouncer,
}

impl InputState {
    /// Drop a wheel zoom still waiting for its burst to settle.
    pub fn discard_wheel(&mut self) {
        self.wheel.cancel();
        self.wheel_accum = 0.0;
        self.wheel_pos = None;
    }
}
