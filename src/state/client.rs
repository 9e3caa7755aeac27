//! Reconciliation façade.
//!
//! [`Client`] owns one session context per connection attempt (progress
//! store, session state, inbound event channel) and is the only thing that
//! mutates it. Remote events go in, game operations and player-facing
//! messages come out.
//!
//! ```text
//!  remote I/O thread            tick thread
//!  ─────────────────            ──────────────────────────────────────────
//!  EventSender ──channel──▶ poll_tick ──▶ ProgressStore ──▶ BridgeQueue ──▶ host
//!                                   │
//!                                   └──▶ SessionState (status diff, timers)
//!
//!  host ──▶ on_local_location_completed ──▶ RemoteClient (outbound)
//! ```
//!
//! Local progress is only changed by what the server confirms. A location
//! the player completes is sent out and marked checked when the server
//! echoes it back.

use std::collections::BTreeMap;

use crossbeam_channel::Receiver;

use super::bridge::{spawn_requests, BridgeQueue, GameOp, LiveSession};
use super::config::SyncConfig;
use super::console::{self, Command, MessageOption};
use super::error::SyncError;
use super::items::{self, AbilityKey, ItemCategory, NetworkItemId, MAJOR_KEY_COUNT};
use super::messages::{MessageLog, Notice};
use super::progress::{DerivedBehavior, ProgressSnapshot, ProgressStore};
use super::remote::{
    event_channel, ConnectRequest, DataStorageOp, RemoteClient, RemoteEvent, SLOT_DATA_FIELDS,
};
use super::session::{ConnectionStatus, SessionState, StatusTransition};

/// Data storage key read by external trackers once the game is beaten.
pub fn completion_key(slot_number: i64) -> String {
    format!("Pseudoregalia - Player {slot_number} - Game Complete")
}

/// State that lives exactly as long as one connection attempt.
#[derive(Debug)]
struct Session {
    state: SessionState,
    progress: ProgressStore,
    events: Receiver<RemoteEvent>,
}

/// What happened during one [`Client::poll_tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Inbound remote events applied this tick
    pub events_applied: usize,

    /// Connection status change observed this tick
    pub transition: Option<StatusTransition>,

    /// An incoming death link was accepted
    pub death_link_received: bool,

    /// Messages to display
    pub notices: Vec<Notice>,
}

/// The synchronization engine.
#[derive(Debug)]
pub struct Client<R: RemoteClient> {
    remote: R,
    config: SyncConfig,
    session: Option<Session>,
    bridge: BridgeQueue,
    messages: MessageLog,
    last_error: Option<SyncError>,
}

impl<R: RemoteClient> Client<R> {
    /// Build a disconnected client.
    pub fn new(remote: R, config: SyncConfig) -> Self {
        let messages = MessageLog::new(config.popup_delay_ticks());
        Self {
            remote,
            config,
            session: None,
            bridge: BridgeQueue::new(),
            messages,
            last_error: None,
        }
    }

    /// Start a new session against `address`.
    ///
    /// Any existing session is closed first. Progress starts from zero; the
    /// server resends everything the slot has received.
    pub fn connect(&mut self, address: &str, slot_name: &str, password: &str) -> Result<(), SyncError> {
        if self.session.is_some() {
            self.disconnect();
        }

        let (events, rx) = event_channel();
        let request = ConnectRequest {
            address: address.to_string(),
            slot_name: slot_name.to_string(),
            password: password.to_string(),
            game: self.config.game_name.clone(),
            client_version: self.config.client_version,
            death_link: self.config.death_link,
            slot_data_fields: SLOT_DATA_FIELDS.iter().map(|f| f.to_string()).collect(),
        };

        if let Err(e) = self.remote.open(&request, events) {
            self.messages
                .system(format!("Could not start a connection to {address}: {e}"));
            return Err(e.into());
        }

        self.last_error = None;
        self.session = Some(Session {
            state: SessionState::new(
                address.to_string(),
                slot_name.to_string(),
                self.config.connect_timeout_ticks(),
            ),
            progress: ProgressStore::new(),
            events: rx,
        });
        self.messages
            .system(format!("Attempting to connect to {address} with name {slot_name}"));
        Ok(())
    }

    /// Close the session and discard its state. No-op while disconnected.
    pub fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.remote.close();
        self.bridge.clear();
        self.messages
            .system(format!("Disconnected from {}.", session.state.address));
    }

    /// Run once per host tick.
    pub fn poll_tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.session.is_some() {
            outcome.events_applied = self.drain_events();

            if let Some(message) = self.remote.take_message() {
                self.messages.popup(message);
            }

            outcome.death_link_received = self.tick_death_link();
            outcome.transition = self.observe_status();
            self.tick_connect_timer();
        }

        outcome.notices = self.messages.tick();
        outcome
    }

    fn drain_events(&mut self) -> usize {
        let events: Vec<RemoteEvent> = match &self.session {
            Some(session) => session.events.try_iter().collect(),
            None => return 0,
        };
        let count = events.len();
        for event in events {
            self.apply_event(event);
        }
        count
    }

    fn apply_event(&mut self, event: RemoteEvent) {
        let result = match event {
            RemoteEvent::ItemReceived { id, notify } => {
                self.on_remote_item_received(id, notify).map(|_| ())
            }
            RemoteEvent::LocationChecked(id) => match self.on_remote_location_checked(id) {
                // Already reported to the message log
                Err(SyncError::MissingLocation(_)) => Ok(()),
                other => other.map(|_| ()),
            },
            RemoteEvent::SlotDataInt { field, value } => self.on_slot_data_int(&field, value),
            RemoteEvent::ItemsCleared => self.on_items_cleared(),
        };
        if let Err(e) = result {
            tracing::warn!("dropped remote event: {e}");
        }
    }

    /// Apply a received item and queue a full resync of the game.
    pub fn on_remote_item_received(
        &mut self,
        id: NetworkItemId,
        notify: bool,
    ) -> Result<ItemCategory, SyncError> {
        let session = self.session.as_mut().ok_or(SyncError::NotConnected)?;

        tracing::info!(
            id,
            notify,
            name = items::item_name(id).unwrap_or("unknown"),
            "receiving item"
        );
        let category = session.progress.apply_received_item(id);
        if !category.is_recognized() {
            self.messages.warning(format!(
                "You were sent an item, but {}. Verify that you're playing on the same version this seed was generated on.",
                SyncError::UnmappedIdentifier(id)
            ));
        }

        self.bridge.push(GameOp::SyncItems(session.progress.snapshot()));
        Ok(category)
    }

    /// Record a location check the server confirmed.
    pub fn on_remote_location_checked(&mut self, id: NetworkItemId) -> Result<bool, SyncError> {
        let session = self.session.as_mut().ok_or(SyncError::NotConnected)?;
        let newly_checked = session.progress.mark_location_checked(id).map_err(|e| {
            self.messages
                .error(format!("{e}. The location data is probably out of date."));
            e
        })?;
        if newly_checked {
            self.respawn_if_live();
        }
        Ok(newly_checked)
    }

    /// Handle one integer slot data field.
    pub fn on_slot_data_int(&mut self, field: &str, value: i64) -> Result<(), SyncError> {
        let session = self.session.as_mut().ok_or(SyncError::NotConnected)?;
        let before = session.progress.options().clone();
        match field {
            "slot_number" => session.state.set_slot_number(value),
            "split_sun_greaves" => {
                let split = value != 0;
                session.progress.set_option("split_sun_greaves", i64::from(split));
                session.progress.set_option("normal_greaves", i64::from(!split));
            }
            other => session.progress.set_option(other, value),
        }

        let locations = session.progress.locations();
        let regated = session
            .progress
            .options()
            .iter()
            .any(|(name, value)| before.get(name) != Some(value) && locations.is_gated_by(name));
        if regated {
            self.respawn_if_live();
        }
        Ok(())
    }

    /// Replace the spawned collectibles if the game already has a spawn list.
    fn respawn_if_live(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.state.status().is_authenticated() {
            self.bridge
                .push(GameOp::SpawnCollectibles(spawn_requests(&session.progress)));
        }
    }

    /// The server is about to resend the full item list.
    pub fn on_items_cleared(&mut self) -> Result<(), SyncError> {
        let session = self.session.as_mut().ok_or(SyncError::NotConnected)?;
        if !session.progress.has_received_items() {
            tracing::debug!("item clear on a fresh store; nothing to reset");
            return Ok(());
        }
        tracing::info!("clearing received items before resync");
        session.progress.clear_received_items();
        self.bridge.push(GameOp::SyncItems(session.progress.snapshot()));
        Ok(())
    }

    /// The player completed a location in game.
    ///
    /// Only sends the check; the local checked flag follows the server's echo.
    pub fn on_local_location_completed(&mut self, id: NetworkItemId) -> Result<(), SyncError> {
        if self.session.is_none() {
            return Err(SyncError::NotConnected);
        }
        tracing::info!(id, "sending check");
        self.remote.send_location_check(id).map_err(|e| {
            tracing::warn!(id, "failed to send check: {e}");
            e.into()
        })
    }

    fn tick_death_link(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if session.state.death_link_mut().tick() {
            self.remote.clear_death_link();
        }

        if self.remote.death_link_pending()
            && session
                .state
                .death_link_mut()
                .arm(self.config.death_link_cooldown_ticks)
        {
            self.messages.info("Receiving death link");
            self.bridge.push(GameOp::Vaporize);
            return true;
        }
        false
    }

    fn observe_status(&mut self) -> Option<StatusTransition> {
        let current = self.remote.connection_status();
        let session = self.session.as_mut()?;
        let transition = session.state.observe(current)?;

        match transition.to {
            ConnectionStatus::Authenticated => {
                self.messages
                    .system(format!("Connected to {}.", session.state.address));
                self.bridge
                    .push(GameOp::SpawnCollectibles(spawn_requests(&session.progress)));
                self.bridge.push(GameOp::SyncItems(session.progress.snapshot()));
            }
            ConnectionStatus::ConnectionRefused => {
                tracing::warn!(address = %session.state.address, "connection refused");
                self.messages.system(
                    "The server refused the connection. Please double-check your connection info and client version, and try again.",
                );
                self.last_error = Some(SyncError::ConnectionRefused);
            }
            ConnectionStatus::Disconnected
                if transition.from == ConnectionStatus::Authenticated =>
            {
                self.messages.warning("Lost connection to the server.");
            }
            _ => {}
        }

        Some(transition)
    }

    fn tick_connect_timer(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state.tick_connect_timer()
            && self.remote.connection_status() == ConnectionStatus::Disconnected
        {
            tracing::warn!(address = %session.state.address, "connect attempt timed out");
            self.messages.system(
                "Could not find the address entered. Please double-check your connection info and try again.",
            );
            self.last_error = Some(SyncError::ConnectTimeout(session.state.address.clone()));
        }
    }

    /// Send a death link, at most once per cooldown window.
    pub fn send_death_signal(&mut self) -> Result<(), SyncError> {
        let session = self.session.as_mut().ok_or(SyncError::NotConnected)?;
        if !session
            .state
            .death_link_mut()
            .arm(self.config.death_link_cooldown_ticks)
        {
            tracing::debug!("death link suppressed by cooldown");
            return Err(SyncError::CooldownActive);
        }
        self.messages.info("Sending death link");
        self.remote.send_death_link()?;
        Ok(())
    }

    /// Report the goal as complete. Send failures are logged only.
    pub fn complete_game(&mut self) -> Result<(), SyncError> {
        let session = self.session.as_ref().ok_or(SyncError::NotConnected)?;

        if let Err(e) = self.remote.story_complete() {
            tracing::warn!("failed to send story completion: {e}");
        }

        match session.state.slot_number() {
            Some(slot) => {
                let key = completion_key(slot);
                match self.remote.set_data_storage(&key, DataStorageOp::Add(0)) {
                    Ok(()) => tracing::info!(key, "completion flag sent"),
                    Err(e) => tracing::warn!(key, "failed to send completion flag: {e}"),
                }
            }
            None => tracing::warn!("slot number unknown; skipping completion flag"),
        }
        Ok(())
    }

    /// Send a chat line to the server.
    pub fn say_chat(&mut self, text: &str) -> Result<(), SyncError> {
        if self.session.is_none() {
            return Err(SyncError::NotConnected);
        }
        self.remote.say(text)?;
        Ok(())
    }

    /// Flip a derived behavior. Returns whether it is now disabled.
    pub fn toggle_derived_behavior(&mut self, name: &str) -> Result<bool, SyncError> {
        let behavior = DerivedBehavior::from_name(name)
            .ok_or_else(|| SyncError::UnknownBehavior(name.to_string()))?;
        let session = self.session.as_mut().ok_or(SyncError::NotConnected)?;

        match session.progress.toggle_derived_behavior(behavior) {
            Ok(disabled) => {
                let state = if disabled { "OFF" } else { "ON" };
                self.messages
                    .system(format!("{} is now {state}.", behavior.display_name()));
                self.bridge.push(GameOp::SyncItems(session.progress.snapshot()));
                Ok(disabled)
            }
            Err(e) => {
                self.messages.system(e.to_string());
                Err(e)
            }
        }
    }

    /// Run a parsed console command.
    pub fn execute(&mut self, command: Command) -> Result<(), SyncError> {
        match command {
            Command::Connect {
                address,
                slot_name,
                password,
            } => self.connect(&address, &slot_name, &password),
            Command::Disconnect => {
                self.disconnect();
                Ok(())
            }
            Command::Say(text) => self.say_chat(&text),
            Command::Messages(MessageOption::ToggleHidden) => {
                self.messages.toggle_hidden();
                Ok(())
            }
            Command::Messages(MessageOption::ToggleMuted) => {
                self.messages.toggle_muted();
                Ok(())
            }
            Command::Toggle(name) => self.toggle_derived_behavior(&name).map(|_| ()),
        }
    }

    /// Parse and run one line of console input, reporting problems to the player.
    pub fn handle_input(&mut self, input: &str) {
        tracing::debug!(input, "console input");
        let result = match console::parse_input(input) {
            Ok(command) => self.execute(command),
            Err(e) => {
                self.messages.system(e.to_string());
                return;
            }
        };
        match result {
            Ok(()) | Err(SyncError::PrerequisiteNotMet(_)) => {}
            Err(e) => self.messages.system(e.to_string()),
        }
    }

    /// Hand pending game operations to the host.
    pub fn drain_game_ops(&mut self) -> Vec<GameOp> {
        self.bridge.drain()
    }

    /// Apply pending game operations to the host.
    pub fn pump(&mut self, host: &mut impl LiveSession) -> usize {
        self.bridge.pump(host)
    }

    /// Check if a session context exists, whatever its connection status.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Check if the server has authenticated the slot.
    pub fn is_connected(&self) -> bool {
        self.status().is_authenticated()
    }

    /// Last status observed from the remote.
    pub fn status(&self) -> ConnectionStatus {
        self.session
            .as_ref()
            .map(|s| s.state.status())
            .unwrap_or_default()
    }

    /// State of the current session, if any.
    pub fn session_state(&self) -> Option<&SessionState> {
        self.session.as_ref().map(|s| &s.state)
    }

    /// Progress store of the current session, if any.
    pub fn progress(&self) -> Option<&ProgressStore> {
        self.session.as_ref().map(|s| &s.progress)
    }

    /// Full progress snapshot, if a session is open.
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.progress().map(ProgressStore::snapshot)
    }

    /// Health pieces received so far (zero without a session).
    pub fn health_pieces(&self) -> u32 {
        self.progress().map_or(0, ProgressStore::health_pieces)
    }

    /// Small keys received so far.
    pub fn small_keys(&self) -> u32 {
        self.progress().map_or(0, ProgressStore::small_keys)
    }

    /// Which major keys have been received.
    pub fn major_keys(&self) -> [bool; MAJOR_KEY_COUNT] {
        self.progress()
            .map_or([false; MAJOR_KEY_COUNT], |p| *p.major_keys())
    }

    /// Counter per upgrade key.
    pub fn ability_counters(&self) -> BTreeMap<AbilityKey, u32> {
        self.progress()
            .map(|p| p.abilities().clone())
            .unwrap_or_default()
    }

    /// Generation options delivered with the slot data.
    pub fn options(&self) -> BTreeMap<String, i64> {
        self.progress()
            .map(|p| p.options().clone())
            .unwrap_or_default()
    }

    /// Most recent connection failure, cleared by the next connect.
    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    /// Message history and display queues.
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The remote client.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Mutable access to the remote client.
    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    /// Connection, session and progress rendered for presentation.
    pub fn status_json(&self) -> serde_json::Value {
        serde_json::json!({
            "connected": self.is_connected(),
            "has_session": self.has_session(),
            "session": self.session_state().map(SessionState::to_json),
            "progress": self.snapshot(),
            "last_error": self.last_error.as_ref().map(|e| e.to_string()),
        })
    }
}
