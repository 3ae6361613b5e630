use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};

use super::components::{chat_area, input_bar, status_bar};
use super::state::{AppState, ConnectionStatus};

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        state: AppState,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        Self {
            state,
            command_sender,
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply_event(event);
        }
    }

    fn send_outgoing(&mut self) {
        let Some(message) = self.state.take_outgoing() else {
            return;
        };
        if let Err(err) = self
            .command_sender
            .try_send(NetworkCommand::SendMessage(message))
        {
            log::warn!("Failed to send command to network: {err}");
            self.state.last_error = Some("message could not be queued".to_string());
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            status_bar::render(ui, &self.state);
        });

        egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
            let online = self.state.status == ConnectionStatus::Subscribed;
            if input_bar::render(ui, &mut self.state.input_text, online) {
                self.send_outgoing();
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, &self.state.messages, &mut self.state.scroll_to_bottom);
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        if let Err(err) = self.command_sender.try_send(NetworkCommand::Shutdown) {
            log::debug!("Network task already stopped: {err}");
        }
    }
}
