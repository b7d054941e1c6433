// In-process stand-in for the poker backend used by the integration tests.
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures_util::{SinkExt, StreamExt};
use pokerterm::{ConnectionState, Session, TableSnapshot};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

// Bind to an ephemeral port to avoid collisions with local services.
pub async fn bind_backend() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    (listener, format!("ws://{addr}/ws"))
}

pub struct Backend {
    ws: WebSocketStream<TcpStream>,
}

impl Backend {
    pub async fn accept(listener: &TcpListener) -> Self {
        Self::handshake(accept_tcp(listener).await).await
    }

    pub async fn handshake(stream: TcpStream) -> Self {
        let ws = accept_async(stream).await.expect("websocket handshake");
        Self { ws }
    }

    // Next text frame sent by the client.
    pub async fn recv_text(&mut self) -> String {
        loop {
            let frame = tokio::time::timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .expect("client should send a frame")
                .expect("stream should stay open")
                .expect("frame should be valid");
            match frame {
                Message::Text(text) => return text.as_str().to_owned(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame from client: {other:?}"),
            }
        }
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::text(text.to_owned()))
            .await
            .expect("send to client");
    }

    // The client must say goodbye with a close frame (or just hang up).
    pub async fn expect_close(mut self) {
        let frame = tokio::time::timeout(STEP_TIMEOUT, self.ws.next())
            .await
            .expect("client should close");
        match frame {
            Some(Ok(Message::Close(_))) | None => {}
            other => panic!("expected close, got {other:?}"),
        }
    }

    // Starts the closing handshake and requires the client to answer it.
    pub async fn close(mut self) {
        self.ws.close(None).await.expect("send close frame");
        let reply = tokio::time::timeout(STEP_TIMEOUT, self.ws.next())
            .await
            .expect("client should answer the close");
        match reply {
            Some(Ok(Message::Close(_))) => {}
            other => panic!("expected a close reply, got {other:?}"),
        }
    }
}

// Accepts the TCP connection without answering the websocket upgrade yet.
pub async fn accept_tcp(listener: &TcpListener) -> TcpStream {
    let (stream, _) = tokio::time::timeout(STEP_TIMEOUT, listener.accept())
        .await
        .expect("client should connect")
        .expect("accept tcp");
    stream
}

/// What the render callback last saw.
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub state: ConnectionState,
    pub snapshot: Option<TableSnapshot>,
    pub notice: Option<String>,
    pub skipped: usize,
}

// A render callback that publishes every repaint into a watch channel.
pub fn observer() -> (
    impl FnMut(&Session) -> anyhow::Result<()> + Send + 'static,
    watch::Receiver<Observed>,
) {
    let (tx, rx) = watch::channel(Observed {
        state: ConnectionState::Connecting,
        snapshot: None,
        notice: None,
        skipped: 0,
    });
    let render = move |session: &Session| -> anyhow::Result<()> {
        tx.send_replace(Observed {
            state: session.state(),
            snapshot: session.snapshot().cloned(),
            notice: session.notice().map(str::to_owned),
            skipped: session.skipped(),
        });
        Ok(())
    };
    (render, rx)
}

pub async fn wait_until(rx: &mut watch::Receiver<Observed>, f: impl FnMut(&Observed) -> bool) {
    tokio::time::timeout(STEP_TIMEOUT, rx.wait_for(f))
        .await
        .expect("condition should be reached in time")
        .expect("client dropped the observer");
}

pub fn press(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}
