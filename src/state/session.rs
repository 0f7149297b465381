use crate::citation::{classify, CitationPanel, Source};
use crate::segment::RenderPlan;
use crate::types::{ApiMessage, ChatMode, Role};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::turn::TurnUpdate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl ChatMessage {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            sources: Vec::new(),
        }
    }

    fn assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSwitch {
    /// Requested mode is already active.
    Unchanged,
    /// Transcript was empty, so the mode changed immediately.
    Applied,
    /// The current conversation would be discarded; call
    /// [`ChatSession::confirm_mode_switch`] or [`ChatSession::cancel_mode_switch`].
    NeedsConfirmation,
}

/// Identifies one in-flight answer. Updates carrying a stale handle are
/// dropped by the session.
#[derive(Debug, Clone)]
pub struct TurnHandle {
    epoch: u64,
    cancel: CancellationToken,
}

impl TurnHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct ActiveTurn {
    epoch: u64,
    cancel: CancellationToken,
    assistant_index: Option<usize>,
}

/// Conversation state for one chat view: transcript, research mode, and the
/// answer currently streaming into it.
pub struct ChatSession {
    mode: ChatMode,
    messages: Vec<ChatMessage>,
    pending_mode: Option<ChatMode>,
    epoch: u64,
    active: Option<ActiveTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(ChatMode::default())
    }
}

impl ChatSession {
    pub fn new(mode: ChatMode) -> Self {
        Self {
            mode,
            messages: Vec::new(),
            pending_mode: None,
            epoch: 0,
            active: None,
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending_mode(&self) -> Option<ChatMode> {
        self.pending_mode
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    pub fn request_mode_switch(&mut self, mode: ChatMode) -> ModeSwitch {
        if mode == self.mode {
            return ModeSwitch::Unchanged;
        }
        if self.messages.is_empty() {
            self.mode = mode;
            self.pending_mode = None;
            return ModeSwitch::Applied;
        }
        self.pending_mode = Some(mode);
        ModeSwitch::NeedsConfirmation
    }

    /// Discard the conversation and enter the pending mode. Any answer still
    /// streaming is cancelled and its late chunks are ignored.
    pub fn confirm_mode_switch(&mut self) -> Option<ChatMode> {
        let mode = self.pending_mode.take()?;
        self.abandon_active_turn();
        self.messages.clear();
        self.mode = mode;
        Some(mode)
    }

    pub fn cancel_mode_switch(&mut self) -> Option<ChatMode> {
        self.pending_mode.take()
    }

    pub fn begin_turn(&mut self, text: &str) -> Result<TurnHandle> {
        let text = text.trim();
        if text.is_empty() {
            bail!("cannot send an empty question");
        }
        if self.active.is_some() {
            bail!("an answer is still streaming; wait for it or cancel it first");
        }
        if let Some(mode) = self.pending_mode {
            bail!(
                "switching to {} is awaiting confirmation; confirm or cancel it first",
                mode.label()
            );
        }

        self.messages.push(ChatMessage::user(text.to_string()));
        self.epoch += 1;
        let cancel = CancellationToken::new();
        self.active = Some(ActiveTurn {
            epoch: self.epoch,
            cancel: cancel.clone(),
            assistant_index: None,
        });
        Ok(TurnHandle {
            epoch: self.epoch,
            cancel,
        })
    }

    /// Transcript in gateway form. Empty assistant placeholders are skipped.
    pub fn history_for_api(&self) -> Vec<ApiMessage> {
        self.messages
            .iter()
            .filter(|message| !(message.role == Role::Assistant && message.content.is_empty()))
            .map(|message| ApiMessage {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }

    pub fn apply_delta(&mut self, handle: &TurnHandle, chunk: &str) -> bool {
        !handle.is_cancelled() && self.append_for_epoch(handle.epoch, chunk)
    }

    pub fn finish_turn(&mut self, handle: &TurnHandle, sources: Vec<Source>) -> bool {
        !handle.is_cancelled() && self.finish_for_epoch(handle.epoch, sources)
    }

    /// End the turn after a transport error. Text received so far is kept.
    pub fn fail_turn(&mut self, handle: &TurnHandle) -> bool {
        if !self.is_current(handle.epoch) {
            return false;
        }
        self.active = None;
        true
    }

    /// Stop the streaming answer at user request, keeping the partial text.
    pub fn cancel_turn(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.abandon_active_turn();
        true
    }

    /// Route a driver update to the turn it belongs to. Returns `false` when
    /// the update was dropped as stale.
    pub fn apply_update(&mut self, update: TurnUpdate, sources: Vec<Source>) -> bool {
        match update {
            TurnUpdate::Delta { epoch, text } => self.append_for_epoch(epoch, &text),
            TurnUpdate::Done { epoch } => self.finish_for_epoch(epoch, sources),
            TurnUpdate::Failed { epoch, .. } => {
                if !self.is_current(epoch) {
                    return false;
                }
                self.active = None;
                true
            }
        }
    }

    /// Layout for the most recent assistant answer, re-segmented from the
    /// full text on every call.
    pub fn latest_answer_plan(&self) -> Option<RenderPlan> {
        let (index, message) = self.latest_assistant()?;
        let streaming = self
            .active
            .as_ref()
            .is_some_and(|active| active.assistant_index == Some(index));
        Some(RenderPlan::for_text(&message.content, streaming))
    }

    /// Citation panel for the most recent answer; hidden while it streams.
    pub fn latest_answer_citations(&self) -> CitationPanel {
        if self.is_streaming() {
            return CitationPanel::Hidden;
        }
        match self.latest_assistant() {
            Some((_, message)) => classify(&message.sources),
            None => CitationPanel::Hidden,
        }
    }

    fn latest_assistant(&self) -> Option<(usize, &ChatMessage)> {
        self.messages
            .iter()
            .enumerate()
            .rev()
            .find(|(_, message)| message.role == Role::Assistant)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.epoch == epoch && !active.cancel.is_cancelled())
    }

    fn append_for_epoch(&mut self, epoch: u64, chunk: &str) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let index = match active.assistant_index {
            Some(index) => index,
            None => {
                self.messages.push(ChatMessage::assistant());
                let index = self.messages.len() - 1;
                active.assistant_index = Some(index);
                index
            }
        };
        self.messages[index].content.push_str(chunk);
        true
    }

    fn finish_for_epoch(&mut self, epoch: u64, sources: Vec<Source>) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        if let Some(index) = self.active.take().and_then(|active| active.assistant_index) {
            self.messages[index].sources = sources;
        }
        true
    }

    fn abandon_active_turn(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}
