/// WebSocket table client - one connection, one session, event-driven.
use crossterm::event::KeyEvent;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::core::protocol::Action;
use crate::core::session::Session;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Writer = SplitSink<Socket, Message>;
type Reader = SplitStream<Socket>;

/// Drives a single session against the backend at `url`.
///
/// There is no reconnection: once the connection closes or fails the session
/// stays terminal, and the client keeps repainting until the key channel
/// closes.
pub struct SessionClient {
    url: String,
}

impl SessionClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Connects, joins and runs the event loop until `keys` closes.
    ///
    /// `render_fn` is called with the session after every handled event.
    /// Returns the finished session so callers can inspect how it ended.
    pub async fn connect_and_play<F>(
        &self,
        mut keys: mpsc::UnboundedReceiver<KeyEvent>,
        mut render_fn: F,
    ) -> anyhow::Result<Session>
    where
        F: FnMut(&Session) -> anyhow::Result<()>,
    {
        let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Action>();
        let mut session = Session::new(outbox_tx);
        render_fn(&session)?;

        info!(url = %self.url, "connecting");
        let connect = connect_async(self.url.as_str());
        tokio::pin!(connect);

        // Keys pressed while connecting are refused by the session.
        let connected = loop {
            tokio::select! {
                result = &mut connect => break result,
                key = keys.recv() => match key {
                    Some(key) => {
                        if let Err(e) = session.handle_key(key) {
                            debug!(error = %e, "key ignored while connecting");
                        }
                        render_fn(&session)?;
                    }
                    None => {
                        info!("quit before the connection was established");
                        session.on_close();
                        return Ok(session);
                    }
                },
            }
        };

        let (mut writer, mut reader) = match connected {
            Ok((stream, response)) => {
                debug!(status = %response.status(), "websocket handshake complete");
                let (writer, reader) = stream.split();
                if let Err(e) = session.on_open() {
                    warn!(error = %e, "failed to join");
                }
                (Some(writer), Some(reader))
            }
            Err(e) => {
                session.on_error(&e);
                (None, None)
            }
        };
        render_fn(&session)?;

        loop {
            tokio::select! {
                frame = next_frame(&mut reader) => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            trace!(payload = %text.as_str(), "message from server");
                            if let Err(e) = session.on_message(text.as_str()) {
                                debug!(error = %e, "table update skipped");
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "close frame received");
                            // Sends the queued close reply before the halves go away.
                            if let Some(mut writer) = writer.take() {
                                if let Err(e) = writer.close().await {
                                    debug!(error = %e, "close reply not delivered");
                                }
                            }
                            session.on_close();
                            reader = None;
                            drain_undelivered(&mut session, &mut outbox_rx);
                        }
                        Some(Ok(other)) => {
                            trace!(?other, "ignoring non-text frame");
                            continue;
                        }
                        Some(Err(e)) => {
                            session.on_error(&e);
                            (writer, reader) = (None, None);
                            drain_undelivered(&mut session, &mut outbox_rx);
                        }
                        None => {
                            session.on_close();
                            (writer, reader) = (None, None);
                            drain_undelivered(&mut session, &mut outbox_rx);
                        }
                    }
                }

                Some(action) = outbox_rx.recv() => {
                    match writer.as_mut() {
                        Some(w) => {
                            if let Err(e) = send_json(w, action).await {
                                session.on_error(&e);
                                session.on_undelivered(action);
                                (writer, reader) = (None, None);
                                drain_undelivered(&mut session, &mut outbox_rx);
                            }
                        }
                        None => session.on_undelivered(action),
                    }
                }

                key = keys.recv() => {
                    let Some(key) = key else { break };
                    if let Err(e) = session.handle_key(key) {
                        debug!(error = %e, "key not sent");
                    }
                }
            }

            render_fn(&session)?;
        }

        if let Some(mut writer) = writer {
            // Flush anything still queued before saying goodbye.
            while let Ok(action) = outbox_rx.try_recv() {
                if let Err(e) = send_json(&mut writer, action).await {
                    warn!(error = %e, ?action, "dropping queued action on shutdown");
                }
            }
            if let Err(e) = writer.send(Message::Close(None)).await {
                debug!(error = %e, "close frame not delivered");
            }
        }
        session.on_close();
        Ok(session)
    }
}

/// Reports every action still queued for a socket that is gone.
fn drain_undelivered(session: &mut Session, outbox: &mut mpsc::UnboundedReceiver<Action>) {
    while let Ok(action) = outbox.try_recv() {
        session.on_undelivered(action);
    }
}

async fn next_frame(
    reader: &mut Option<Reader>,
) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match reader {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}

async fn send_json(writer: &mut Writer, action: Action) -> anyhow::Result<()> {
    let json = action.to_json()?;
    debug!(payload = %json, "sending action");
    writer.send(Message::text(json)).await?;
    Ok(())
}
