use eframe::egui;

/// Room left beside the text field for the Send button.
const SEND_BUTTON_WIDTH: f32 = 60.0;

fn text_field_width(available: f32) -> f32 {
    (available - SEND_BUTTON_WIDTH).max(0.0)
}

/// Returns `true` when the user asked to send, by button or Enter.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, enabled: bool) -> bool {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Type a message")
                .desired_width(text_field_width(ui.available_width())),
        );
        if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    send && enabled
}
