use crate::app::SlideViewApp;

pub fn show(ctx: &egui::Context, app: &mut SlideViewApp) {
    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.add_space(2.0);

        // Log area, fixed height for 3 lines.
        let line_height = ui.text_style_height(&egui::TextStyle::Body);
        let spacing = ui.spacing().item_spacing.y;
        let log_height = line_height * 3.0 + spacing * 2.0;

        egui::ScrollArea::vertical()
            .max_height(log_height)
            .min_scrolled_height(log_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for msg in &app.ui_state.log_messages {
                    ui.label(msg);
                }
            });

        ui.separator();

        ui.horizontal(|ui| {
            if app.view.status.is_empty() {
                ui.label("No image");
            } else {
                ui.label(&app.view.status);
            }
            if app.session.highlight_mode() {
                ui.separator();
                let count = app.session.highlighted_tiles().map(|t| t.len()).unwrap_or(0);
                ui.label(format!("Highlighted: {count}"));
            }
            if app.ui_state.crop_mode {
                ui.separator();
                ui.label("Crop mode");
            }
        });

        ui.add_space(2.0);
    });
}
