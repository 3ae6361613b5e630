use eframe::egui;

use crate::ui::state::{AppState, ConnectionStatus};

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.horizontal(|ui| {
        let (color, text) = match &state.status {
            ConnectionStatus::Connecting => (egui::Color32::YELLOW, "connecting…".to_string()),
            ConnectionStatus::Connected { socket_id } => {
                (egui::Color32::YELLOW, format!("connected ({socket_id})"))
            }
            ConnectionStatus::Subscribed => (egui::Color32::GREEN, "online".to_string()),
            ConnectionStatus::Offline { reason } => {
                (egui::Color32::RED, format!("offline: {reason}"))
            }
        };
        ui.colored_label(color, "●");
        ui.label(text);
        ui.separator();
        ui.label(format!("#{}", state.channel));
        ui.separator();
        ui.label(egui::RichText::new(format!("you are {}", state.display_name)).strong());
    });

    if let Some(error) = &state.last_error {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }
}
