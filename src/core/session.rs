/// One client session: the connection lifecycle, the outbound queue and the
/// latest table snapshot.
use std::fmt;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::input;
use crate::core::protocol::{Action, TableSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    /// Closed and errored sessions never come back.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Open",
            ConnectionState::Closed => "Closed",
            ConnectionState::Errored => "Errored",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub enum SessionError {
    /// An action was attempted while the connection was not open.
    NotOpen(ConnectionState),
    /// The transport reported open for a session that was not connecting.
    UnexpectedOpen(ConnectionState),
    /// The socket writer has gone away.
    OutboxClosed,
    /// An inbound payload was not a table snapshot.
    Decode(serde_json::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotOpen(state) => write!(f, "connection is not open ({state})"),
            SessionError::UnexpectedOpen(state) => write!(f, "open event while {state}"),
            SessionError::OutboxClosed => f.write_str("outbound queue closed"),
            SessionError::Decode(e) => write!(f, "malformed table update: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

pub struct Session {
    state: ConnectionState,
    outbox: mpsc::UnboundedSender<Action>,
    snapshot: Option<TableSnapshot>,
    skipped: usize,
    notice: Option<String>,
}

impl Session {
    /// A fresh session in `Connecting`. Actions accepted by `send_action` are
    /// pushed, in order, onto `outbox` for the socket writer.
    pub fn new(outbox: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            state: ConnectionState::Connecting,
            outbox,
            snapshot: None,
            skipped: 0,
            notice: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn snapshot(&self) -> Option<&TableSnapshot> {
        self.snapshot.as_ref()
    }

    /// Inbound payloads dropped because they failed to decode.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Last status message for the player.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Transport is up: join the table. This is always the first message.
    pub fn on_open(&mut self) -> Result<(), SessionError> {
        if self.state != ConnectionState::Connecting {
            warn!(state = %self.state, "ignoring open event");
            return Err(SessionError::UnexpectedOpen(self.state));
        }
        info!("connected to the backend");
        self.state = ConnectionState::Open;
        self.send_action(Action::Join)?;
        self.notice = Some("joined the table".into());
        Ok(())
    }

    /// Decodes one inbound text frame. A bad payload is skipped and leaves the
    /// connection and the previous snapshot untouched.
    pub fn on_message(&mut self, raw: &str) -> Result<Option<&TableSnapshot>, SessionError> {
        if self.state != ConnectionState::Open {
            debug!(state = %self.state, "dropping message outside an open session");
            return Ok(None);
        }
        match TableSnapshot::parse(raw) {
            Ok(snapshot) => {
                debug!(pot = snapshot.pot, current_bet = snapshot.current_bet, "table update");
                self.snapshot = Some(snapshot);
                Ok(self.snapshot.as_ref())
            }
            Err(e) => {
                self.skipped += 1;
                warn!(
                    error = %e,
                    len = raw.len(),
                    payload = payload_preview(raw),
                    "skipping malformed table update"
                );
                self.notice = Some("skipped a malformed table update".into());
                Err(SessionError::Decode(e))
            }
        }
    }

    pub fn on_close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        info!("disconnected from the backend");
        self.state = ConnectionState::Closed;
        self.notice = Some("connection closed".into());
    }

    pub fn on_error(&mut self, err: &dyn fmt::Display) {
        if self.state.is_terminal() {
            return;
        }
        error!(error = %err, "websocket error");
        self.state = ConnectionState::Errored;
        self.notice = Some(format!("connection error: {err}"));
    }

    /// Queues `action` for the backend. Refused unless the session is open.
    pub fn send_action(&mut self, action: Action) -> Result<(), SessionError> {
        if self.state != ConnectionState::Open {
            warn!(?action, state = %self.state, "refusing to send");
            self.notice = Some(format!("not sent: connection is {}", self.state));
            return Err(SessionError::NotOpen(self.state));
        }
        self.outbox.send(action).map_err(|_| SessionError::OutboxClosed)?;
        debug!(?action, "queued action");
        Ok(())
    }

    /// An action was accepted but its socket went away before it was written.
    pub fn on_undelivered(&mut self, action: Action) {
        warn!(?action, state = %self.state, "action was never transmitted");
        self.notice = Some(format!("not sent: {action:?} (connection is {})", self.state));
    }

    /// Sends the action bound to `key`. Unbound keys and key releases send
    /// nothing and return `Ok(None)`.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Option<Action>, SessionError> {
        if !input::is_actionable(&key) {
            return Ok(None);
        }
        let Some(action) = input::action_for_key(key.code) else {
            return Ok(None);
        };
        self.send_action(action)?;
        self.notice = Some(format!("sent {action:?}"));
        Ok(Some(action))
    }
}

/// Longest slice of an inbound payload written to the log.
const LOG_PAYLOAD_LIMIT: usize = 256;

fn payload_preview(raw: &str) -> &str {
    match raw.char_indices().nth(LOG_PAYLOAD_LIMIT) {
        Some((end, _)) => &raw[..end],
        None => raw,
    }
}
