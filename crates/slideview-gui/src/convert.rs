use slideview_core::render::DisplayFrame;

/// Convert a rendered RGB/RGBA frame to an egui ColorImage.
pub fn frame_to_color_image(frame: &DisplayFrame) -> egui::ColorImage {
    let size = [frame.width() as usize, frame.height() as usize];
    match frame.bands() {
        4 => egui::ColorImage::from_rgba_unmultiplied(size, frame.as_bytes()),
        _ => egui::ColorImage::from_rgb(size, frame.as_bytes()),
    }
}
