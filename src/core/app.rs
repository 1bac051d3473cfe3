use reqwest::Client;
use tracing::{debug, warn};

use crate::api::models::{fetch_models, sort_models};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::constants::ROLE_ORDER;
use crate::core::message::{Message, Role};
use crate::core::session::{submit, Session, SubmitOutcome, TurnState};
use crate::ui::picker::{PickerItem, PickerState};

/// Which selection list the open picker is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Model,
    Role,
}

/// Session/UI controller: owns the conversation, the selection state, and
/// the turn state machine. Mutated only on the UI event loop; the
/// streaming worker reaches it exclusively through [`App::on_stream_event`].
pub struct App {
    pub session: Session,
    pub input: crate::utils::input::InputLine,
    pub model: String,
    pub role: Role,
    pub models: Vec<String>,
    pub turn_state: TurnState,
    /// Streamed text of the in-flight assistant turn, rendered live.
    pub current_response: String,
    pub current_stream_id: u64,
    /// Display-only notice shown in the transcript (e.g., after a purge).
    pub notice: Option<String>,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub picker: Option<PickerState>,
    pub picker_kind: Option<PickerKind>,
    client: Client,
    host: String,
    stream: ChatStreamService,
}

impl App {
    pub fn new(host: String, model: String, stream: ChatStreamService) -> Self {
        Self {
            session: Session::new(),
            input: crate::utils::input::InputLine::new(),
            model,
            role: Role::User,
            models: Vec::new(),
            turn_state: TurnState::Idle,
            current_response: String::new(),
            current_stream_id: 0,
            notice: None,
            scroll_offset: 0,
            auto_scroll: true,
            picker: None,
            picker_kind: None,
            client: Client::new(),
            host,
            stream,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Query the daemon's model list. On any failure the list collapses to
    /// the currently selected model; the failure is logged, never shown.
    pub async fn load_models(&mut self) {
        match fetch_models(&self.client, &self.host).await {
            Ok(mut models) if !models.is_empty() => {
                sort_models(&mut models);
                if !models.iter().any(|m| m == &self.model) {
                    // Keep the configured model usable even if the daemon
                    // does not advertise it.
                    models.insert(0, self.model.clone());
                }
                debug!(count = models.len(), "loaded model list");
                self.models = models;
            }
            Ok(_) => {
                warn!("daemon returned an empty model list, using fallback");
                self.models = vec![self.model.clone()];
            }
            Err(e) => {
                warn!(error = %e, "failed to retrieve models, using fallback");
                self.models = vec![self.model.clone()];
            }
        }
    }

    /// Submit the input box under the currently selected role.
    ///
    /// Only a user-role submit starts a worker and disables the input
    /// surface; authored system/assistant turns are appended silently.
    pub fn submit(&mut self) {
        if !self.turn_state.input_enabled() {
            return;
        }

        let text = self.input.take();
        match submit(&mut self.session, self.role, &text) {
            SubmitOutcome::Rejected => {
                // Restore rejected input so typed whitespace is not lost.
                self.input.insert_str(&text);
            }
            SubmitOutcome::Appended => {
                self.notice = None;
                self.auto_scroll = true;
            }
            SubmitOutcome::NeedsCompletion => {
                self.notice = None;
                self.auto_scroll = true;
                self.start_worker();
            }
        }
    }

    fn start_worker(&mut self) {
        self.turn_state = TurnState::Submitting;
        self.current_response.clear();
        self.current_stream_id += 1;
        self.stream.spawn_stream(StreamParams {
            client: self.client.clone(),
            host: self.host.clone(),
            model: self.model.clone(),
            api_messages: self.session.api_messages(),
            stream_id: self.current_stream_id,
        });
    }

    /// Apply one worker notification. Events carrying a stale stream id,
    /// or arriving while no turn is in flight, are dropped.
    pub fn on_stream_event(&mut self, message: StreamMessage, stream_id: u64) {
        if stream_id != self.current_stream_id || self.turn_state != TurnState::Submitting {
            debug!(stream_id, "dropping stale stream event");
            return;
        }
        match message {
            StreamMessage::Chunk(content) => {
                self.current_response.push_str(&content);
            }
            StreamMessage::Done(full) => {
                self.session.push(Message::assistant(full.trim()));
                self.current_response.clear();
                self.turn_state = TurnState::Idle;
            }
        }
    }

    /// Clear the conversation memory and the visible transcript. Model and
    /// role selection are untouched.
    pub fn purge(&mut self) {
        self.session.purge();
        self.current_response.clear();
        self.scroll_offset = 0;
        self.auto_scroll = true;
        self.notice = Some("Memory has been purged.".to_string());
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Advance the role selector to the next entry in display order.
    pub fn cycle_role(&mut self) {
        let index = ROLE_ORDER.iter().position(|r| *r == self.role).unwrap_or(0);
        self.role = ROLE_ORDER[(index + 1) % ROLE_ORDER.len()];
    }

    pub fn open_model_picker(&mut self) {
        let items: Vec<PickerItem> = self
            .models
            .iter()
            .map(|name| PickerItem::new(name.clone(), name.clone()))
            .collect();
        let selected = self
            .models
            .iter()
            .position(|m| m == &self.model)
            .unwrap_or(0);
        self.picker = Some(PickerState::new("Select Model", items, selected));
        self.picker_kind = Some(PickerKind::Model);
    }

    pub fn open_role_picker(&mut self) {
        let items: Vec<PickerItem> = ROLE_ORDER
            .iter()
            .map(|role| PickerItem::new(role.as_str(), role.as_str()))
            .collect();
        let selected = ROLE_ORDER.iter().position(|r| *r == self.role).unwrap_or(0);
        self.picker = Some(PickerState::new("Select Role", items, selected));
        self.picker_kind = Some(PickerKind::Role);
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
        self.picker_kind = None;
    }

    /// Apply the highlighted picker entry to the selection state.
    pub fn apply_picker_selection(&mut self) {
        let Some(picker) = &self.picker else {
            return;
        };
        let Some(id) = picker.selected_id().map(|s| s.to_string()) else {
            self.close_picker();
            return;
        };
        match self.picker_kind {
            Some(PickerKind::Model) => self.model = id,
            Some(PickerKind::Role) => {
                if let Ok(role) = Role::try_from(id.as_str()) {
                    self.role = role;
                }
            }
            None => {}
        }
        self.close_picker();
    }
}
