use super::transport::{ConnectRequest, Outbound, Transport, TransportEvent, TransportEvents};
use crate::error::{SttError, SttResult};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue, Request};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;
use tracing::{debug, info, warn};

/// WebSocket transport to the streaming recognize endpoint
pub struct WebSocketTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
}

impl WebSocketTransport {
    pub fn new() -> (Self, TransportEvents) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                events,
                outbound: None,
            },
            events_rx,
        )
    }
}

fn build_request(request: &ConnectRequest) -> SttResult<Request<()>> {
    let mut ws_request = request
        .uri
        .as_str()
        .into_client_request()
        .map_err(|e| SttError::Configuration(format!("invalid recognizer URI: {}", e)))?;

    if let Some(token) = &request.bearer {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SttError::Token(format!("token is not a valid header value: {}", e)))?;
        ws_request.headers_mut().insert(AUTHORIZATION, value);
    }

    Ok(ws_request)
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    async fn open(&mut self, request: ConnectRequest) -> SttResult<()> {
        let ws_request = build_request(&request)?;
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let events = self.events.clone();

        // A previous connection has already reported Close by the time we reopen.
        self.outbound = Some(outbound_tx);

        info!("Opening recognizer connection: {}", request.uri);

        tokio::spawn(async move {
            let ws_stream = match connect_async(ws_request).await {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!("Recognizer connection failed: {}", e);
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    let _ = events.send(TransportEvent::Close);
                    return;
                }
            };

            let _ = events.send(TransportEvent::Open);
            let (mut ws_tx, mut ws_rx) = ws_stream.split();

            loop {
                tokio::select! {
                    outgoing = outbound_rx.recv() => match outgoing {
                        Some(msg) => {
                            if let Err(e) = ws_tx.send(msg).await {
                                let _ = events.send(TransportEvent::Error(e.to_string()));
                                break;
                            }
                        }
                        None => {
                            debug!("Closing recognizer connection");
                            let _ = ws_tx.close().await;
                            break;
                        }
                    },
                    incoming = ws_rx.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = events.send(TransportEvent::Message(text.to_string()));
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Recognizer closed connection: {:?}", frame);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = events.send(TransportEvent::Error(e.to_string()));
                            break;
                        }
                        None => break,
                    },
                }
            }

            let _ = events.send(TransportEvent::Close);
        });

        Ok(())
    }

    async fn send(&mut self, message: Outbound) -> SttResult<()> {
        let tx = self
            .outbound
            .as_ref()
            .ok_or_else(|| SttError::Transport("connection is not open".into()))?;

        let msg = match message {
            Outbound::Text(text) => Message::Text(text.into()),
            Outbound::Binary(bytes) => Message::Binary(bytes.into()),
        };

        tx.send(msg)
            .map_err(|_| SttError::Transport("connection is closed".into()))
    }

    async fn close(&mut self) -> SttResult<()> {
        // Dropping the sender makes the connection task send a close frame.
        // The task also exits this way when the transport itself is dropped.
        self.outbound.take();
        Ok(())
    }

    fn name(&self) -> &str {
        "websocket"
    }
}
