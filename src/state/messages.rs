//! Player-facing message log.
//!
//! Every diagnostic the engine produces is recorded here and mirrored to
//! `tracing`. The presentation layer picks up [`Notice`]s once per tick:
//! system notices immediately, popups one at a time with a minimum spacing
//! so the screen never holds more than two.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Kind of message, which decides where it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Log only
    Info,
    /// Server chat and item notifications, shown as a popup
    Popup,
    /// Client status shown in the small message area
    System,
    Warning,
    Error,
}

/// A recorded message.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub kind: MessageKind,
    pub text: String,
    pub logged_at: DateTime<Utc>,
}

/// Something the presentation layer should show this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: MessageKind,
    pub text: String,
    pub mute_sound: bool,
}

/// Message history plus the popup/system display queues.
#[derive(Debug, Clone)]
pub struct MessageLog {
    history: Vec<LogEntry>,
    popups: VecDeque<String>,
    system: VecDeque<String>,

    /// Ticks left before the next popup may show
    popup_lock: u32,

    popup_delay_ticks: u32,
    hidden: bool,
    muted: bool,
}

impl MessageLog {
    /// Empty log with the given popup spacing.
    pub fn new(popup_delay_ticks: u32) -> Self {
        Self {
            history: Vec::new(),
            popups: VecDeque::new(),
            system: VecDeque::new(),
            popup_lock: 0,
            popup_delay_ticks,
            hidden: false,
            muted: false,
        }
    }

    /// Record a message and queue it for display.
    pub fn push(&mut self, kind: MessageKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            MessageKind::Info => tracing::info!("{text}"),
            MessageKind::Popup => {
                tracing::info!("message: {text}");
                if !self.hidden {
                    self.popups.push_back(text.clone());
                }
            }
            MessageKind::System => {
                tracing::info!("system: {text}");
                self.system.push_back(text.clone());
            }
            MessageKind::Warning => tracing::warn!("{text}"),
            MessageKind::Error => tracing::error!("{text}"),
        }
        self.history.push(LogEntry {
            kind,
            text,
            logged_at: Utc::now(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(MessageKind::Info, text);
    }

    pub fn popup(&mut self, text: impl Into<String>) {
        self.push(MessageKind::Popup, text);
    }

    pub fn system(&mut self, text: impl Into<String>) {
        self.push(MessageKind::System, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(MessageKind::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(MessageKind::Error, text);
    }

    /// Notices to display this tick.
    pub fn tick(&mut self) -> Vec<Notice> {
        let mute_sound = self.muted;
        let mut notices: Vec<Notice> = self
            .system
            .drain(..)
            .map(|text| Notice {
                kind: MessageKind::System,
                text,
                mute_sound,
            })
            .collect();

        if self.popup_lock > 0 {
            self.popup_lock -= 1;
        } else if let Some(text) = self.popups.pop_front() {
            notices.push(Notice {
                kind: MessageKind::Popup,
                text,
                mute_sound,
            });
            self.popup_lock = self.popup_delay_ticks;
        }

        notices
    }

    /// Hide or show popups. Hiding drops the queued ones.
    pub fn toggle_hidden(&mut self) -> bool {
        self.hidden = !self.hidden;
        if self.hidden {
            self.popups.clear();
            self.system("Messages are now hidden.");
        } else {
            self.system("Messages are no longer hidden.");
        }
        self.hidden
    }

    /// Mute or unmute notice sounds.
    pub fn toggle_muted(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.system("Message sounds are now muted.");
        } else {
            self.system("Message sounds are no longer muted.");
        }
        self.muted
    }

    /// Check if popups are hidden.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Check if notice sounds are muted.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Every message recorded so far.
    pub fn history(&self) -> &[LogEntry] {
        &self.history
    }

    /// Number of recorded messages of `kind`.
    pub fn count(&self, kind: MessageKind) -> usize {
        self.history.iter().filter(|e| e.kind == kind).count()
    }

    /// Popups waiting to be shown.
    pub fn pending_popups(&self) -> usize {
        self.popups.len()
    }
}
