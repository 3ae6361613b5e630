use eframe::egui;

use crate::ui::state::ChatLine;

/// One paragraph per line. `scroll_to_bottom` is cleared once the area has
/// been scrolled to its end.
pub fn render(ui: &mut egui::Ui, lines: &[ChatLine], scroll_to_bottom: &mut bool) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for line in lines {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(line.received_at.format("%H:%M:%S").to_string())
                            .weak(),
                    );
                    ui.label(line.paragraph());
                });
            }

            if *scroll_to_bottom {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                *scroll_to_bottom = false;
            }
        });
}
