//! App actor - message loop processing UI events, network responses and reveal progress

use tokio::sync::mpsc;

use crate::app::commands::TurnStart;
use crate::app::state::{AppState, RevealJob};
use crate::messages::ui_events::InputMode;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, RevealEvent, UiEvent};
use crate::reveal::RevealTask;

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
    reveal_tx: mpsc::UnboundedSender<RevealEvent>,
    reveal_rx: mpsc::UnboundedReceiver<RevealEvent>,
    /// The single reveal allowed to run at a time
    reveal: Option<RevealTask>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let (reveal_tx, reveal_rx) = mpsc::unbounded_channel();
        AppActor {
            state,
            network_tx,
            render_tx,
            reveal_tx,
            reveal_rx,
            reveal: None,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event).await {
                        // Quit signal received
                        self.state.stop_streaming();
                        if let Some(task) = self.reveal.take() {
                            task.cancel_and_wait().await;
                        }
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                }
                Some(response) = net_rx.recv() => {
                    self.handle_response(response).await;
                }
                Some(event) = self.reveal_rx.recv() => {
                    self.state.apply_reveal(event);
                }
                else => break,
            }
            let _ = self.render_tx.send(self.state.to_render_state());
        }
    }

    /// Cancel any running reveal, wait for it to exit, then start `job`
    async fn start_reveal(&mut self, job: RevealJob) {
        if let Some(previous) = self.reveal.take() {
            if !previous.is_finished() {
                tracing::debug!(message_id = %previous.message_id, "Cancelling previous reveal");
            }
            previous.cancel_and_wait().await;
        }
        self.reveal = Some(RevealTask::spawn(
            job.message_id,
            job.text,
            job.cancel,
            self.reveal_tx.clone(),
        ));
    }

    fn dispatch(&self, cmd: Option<NetworkCommand>) {
        if let Some(cmd) = cmd {
            let _ = self.network_tx.send(cmd);
        }
    }

    async fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::Chat { id, outcome } => {
                if let Some(job) = self.state.accept_chat(id, outcome) {
                    self.start_reveal(job).await;
                }
            }
            NetworkResponse::ProxyReplied {
                id,
                outcome,
                elapsed_ms,
            } => self.state.accept_proxy(id, outcome, elapsed_ms),
            NetworkResponse::PreviewLoaded { id, preview } => {
                self.state.accept_preview(id, Ok(preview))
            }
            NetworkResponse::PreviewFailed { id, error } => {
                self.state.accept_preview(id, Err(error))
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    async fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::InsertNewline => self.state.insert_newline(),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Chat
            UiEvent::Submit => match self.state.submit_input() {
                Some(TurnStart::Network(cmd)) => self.dispatch(Some(cmd)),
                Some(TurnStart::Local(job)) => self.start_reveal(job).await,
                None => {}
            },
            UiEvent::StopStreaming => self.state.stop_streaming(),
            UiEvent::SelectPrev => self.state.select_prev(),
            UiEvent::SelectNext => self.state.select_next(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Disclosure
            UiEvent::ChooseManual => self.state.choose_manual(),
            UiEvent::ChooseAutomatic => self.state.choose_automatic(),
            UiEvent::ToggleCollapse => self.state.toggle_collapse(),
            UiEvent::Execute => self.state.execute(),

            // Execution console
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::NextRow => self.state.next_row(),
            UiEvent::PrevRow => self.state.prev_row(),
            UiEvent::AddRow => self.state.add_row(),
            UiEvent::RemoveRow => self.state.remove_row(),
            UiEvent::ToggleRow => self.state.toggle_row(),
            UiEvent::NextColumn => self.state.next_column(),
            UiEvent::SendRequest => {
                // Stop editing first if in URL field
                if self.state.input_mode == InputMode::Editing {
                    self.state.stop_editing();
                }
                let cmd = self.state.send_console();
                self.dispatch(cmd);
            }
            UiEvent::ToggleAutoFormat => self.state.toggle_auto_format(),
            UiEvent::ExportCurl => self.state.export_curl(),
            UiEvent::CloseConsole => self.state.close_console(),

            // File preview
            UiEvent::OpenPreview => {
                let cmd = self.state.open_preview();
                self.dispatch(cmd);
            }
            UiEvent::PrevHeading => self.state.prev_heading(),
            UiEvent::NextHeading => self.state.next_heading(),
            UiEvent::SelectHeading => self.state.select_heading(),
            UiEvent::ClosePreview => self.state.close_preview(),

            // Clear chat
            UiEvent::RequestClearChat => self.state.request_clear_chat(),
            UiEvent::ConfirmClear => self.state.confirm_clear(),
            UiEvent::CancelClear => self.state.cancel_clear(),
            UiEvent::ToggleSkipClearConfirm => self.state.toggle_skip_clear_confirm(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::constants::GREETING_TEXT;
    use crate::storage::Storage;

    #[tokio::test(start_paused = true)]
    async fn test_greeting_is_revealed_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Config::default(), Storage::new(dir.path().to_path_buf()));
        let (network_tx, _network_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_net_tx, net_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(state, network_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, net_rx));

        for c in "hi".chars() {
            ui_tx.send(UiEvent::CharInput(c)).unwrap();
        }
        ui_tx.send(UiEvent::Submit).unwrap();

        let mut last = None;
        while let Some(render) = render_rx.recv().await {
            let done = render.messages.len() == 2 && !render.is_streaming;
            last = Some(render);
            if done {
                break;
            }
        }

        let render = last.unwrap();
        assert_eq!(render.messages[1].content, GREETING_TEXT);
        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_reveal_supersedes_stopped_one() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Config::default(), Storage::new(dir.path().to_path_buf()));
        let (network_tx, _network_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_net_tx, net_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(AppActor::new(state, network_tx, render_tx).run(ui_rx, net_rx));
        let submit = |text: &str| {
            for c in text.chars() {
                ui_tx.send(UiEvent::CharInput(c)).unwrap();
            }
            ui_tx.send(UiEvent::Submit).unwrap();
        };

        submit("hi");
        while let Some(render) = render_rx.recv().await {
            if render.messages.len() == 2 && !render.messages[1].content.is_empty() {
                break;
            }
        }

        ui_tx.send(UiEvent::StopStreaming).unwrap();
        submit("hello");

        let mut frozen: Option<String> = None;
        let mut last = None;
        while let Some(render) = render_rx.recv().await {
            if render.messages.len() == 4 {
                let old = render.messages[1].content.clone();
                match &frozen {
                    Some(first) => assert_eq!(&old, first, "stopped reveal kept updating"),
                    None => frozen = Some(old),
                }
                if !render.is_streaming {
                    last = Some(render);
                    break;
                }
            }
        }

        let old = frozen.unwrap();
        assert!(GREETING_TEXT.starts_with(&old));
        assert!(old.len() < GREETING_TEXT.len());
        assert_eq!(last.unwrap().messages[3].content, GREETING_TEXT);

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_dispatches_chat_command() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Config::default(), Storage::new(dir.path().to_path_buf()));
        let (network_tx, mut network_rx) = mpsc::unbounded_channel();
        let (render_tx, _render_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_net_tx, net_rx) = mpsc::unbounded_channel();

        tokio::spawn(AppActor::new(state, network_tx, render_tx).run(ui_rx, net_rx));
        for c in "list items".chars() {
            ui_tx.send(UiEvent::CharInput(c)).unwrap();
        }
        ui_tx.send(UiEvent::Submit).unwrap();

        match network_rx.recv().await {
            Some(NetworkCommand::Chat { message, .. }) => assert_eq!(message, "list items"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
