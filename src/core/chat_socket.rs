use std::error::Error as StdError;
use std::fmt;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, tungstenite, tungstenite::Message as WsMessage, MaybeTlsStream,
    WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::conversations::{create_conversation, end_conversation};
use crate::api::ApiError;
use crate::utils::url::construct_socket_url;

#[derive(Debug)]
pub enum SocketEvent {
    /// Conversation created and socket connected; frames for the server go into `outbound`.
    Opened {
        conversation_id: String,
        outbound: mpsc::UnboundedSender<String>,
    },
    Frame(String),
    Closed,
    Failed(String),
}

#[derive(Debug)]
pub enum SessionError {
    Api(ApiError),
    Socket(tungstenite::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Api(source) => write!(f, "could not create conversation: {source}"),
            SessionError::Socket(source) => write!(f, "could not open socket: {source}"),
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionError::Api(source) => Some(source),
            SessionError::Socket(source) => Some(source),
        }
    }
}

pub struct SessionParams {
    pub client: reqwest::Client,
    pub server_url: String,
    pub generation: u64,
    pub cancel_token: CancellationToken,
}

pub struct EndParams {
    pub client: reqwest::Client,
    pub server_url: String,
    pub conversation_id: String,
}

#[derive(Clone)]
pub struct ChatSocketService {
    tx: mpsc::UnboundedSender<(SocketEvent, u64)>,
}

impl ChatSocketService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(SocketEvent, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_session(&self, params: SessionParams) {
        let tx = self.tx.clone();
        tokio::spawn(run_session(params, tx));
    }

    /// Best-effort `end` call; failures are only logged.
    pub fn spawn_end(&self, params: EndParams) {
        tokio::spawn(async move {
            let EndParams {
                client,
                server_url,
                conversation_id,
            } = params;
            match end_conversation(&client, &server_url, &conversation_id).await {
                Ok(()) => debug!(%conversation_id, "conversation ended"),
                Err(err) => debug!(%conversation_id, error = %err, "ending conversation failed"),
            }
        });
    }
}

type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect_session(
    client: &reqwest::Client,
    server_url: &str,
) -> Result<(String, SocketStream), SessionError> {
    let created = create_conversation(client, server_url)
        .await
        .map_err(SessionError::Api)?;
    let socket_url = construct_socket_url(server_url, &format!("ws/{}", created.conversation_id));
    debug!(%socket_url, "connecting socket");
    let (socket, _response) = connect_async(socket_url.as_str())
        .await
        .map_err(SessionError::Socket)?;
    Ok((created.conversation_id, socket))
}

async fn run_session(params: SessionParams, tx: mpsc::UnboundedSender<(SocketEvent, u64)>) {
    let SessionParams {
        client,
        server_url,
        generation,
        cancel_token,
    } = params;

    let (conversation_id, socket) = tokio::select! {
        result = connect_session(&client, &server_url) => match result {
            Ok(connected) => connected,
            Err(err) => {
                warn!(generation, error = %err, "session failed to open");
                let _ = tx.send((SocketEvent::Failed(err.to_string()), generation));
                return;
            }
        },
        _ = cancel_token.cancelled() => return,
    };

    info!(generation, %conversation_id, "session open");
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let _ = tx.send((
        SocketEvent::Opened {
            conversation_id,
            outbound: outbound_tx,
        },
        generation,
    ));

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                let _ = sink.send(WsMessage::Close(None)).await;
                debug!(generation, "session cancelled");
                return;
            }
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = tx.send((SocketEvent::Frame(text), generation));
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    let _ = tx.send((SocketEvent::Frame(text), generation));
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(generation, error = %err, "socket read failed");
                    break;
                }
            },
            outgoing = outbound_rx.recv() => match outgoing {
                Some(text) => {
                    if let Err(err) = sink.send(WsMessage::Text(text)).await {
                        debug!(generation, error = %err, "socket write failed");
                        break;
                    }
                }
                None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            },
        }
    }

    info!(generation, "connection closed");
    let _ = tx.send((SocketEvent::Closed, generation));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    const WAIT: Duration = Duration::from_secs(5);

    fn test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client should build")
    }

    async fn read_request_head(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = stream.read(&mut chunk).await.expect("read request");
            assert!(read > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..read]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<(SocketEvent, u64)>,
    ) -> (SocketEvent, u64) {
        timeout(WAIT, rx.recv())
            .await
            .expect("event should arrive")
            .expect("channel open")
    }

    #[tokio::test]
    async fn creates_conversation_then_relays_frames_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (path_tx, path_rx) = oneshot::channel::<String>();

        let server = tokio::spawn(async move {
            let (mut http, _) = listener.accept().await.expect("accept http");
            let head = read_request_head(&mut http).await;
            assert!(head.starts_with("POST /conversations HTTP/1.1"), "{head}");
            let body = r#"{"conversation_id":"c-17"}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\nconnection: close\r\ncontent-length: {}\r\n\r\n{}",
                body.len(),
                body
            );
            http.write_all(response.as_bytes()).await.expect("write");
            drop(http);

            let (ws_stream, _) = listener.accept().await.expect("accept ws");
            let mut ws = tokio_tungstenite::accept_hdr_async(
                ws_stream,
                move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let _ = path_tx.send(req.uri().path().to_string());
                    Ok(resp)
                },
            )
            .await
            .expect("handshake");

            ws.send(WsMessage::Text("Plant **early**".into()))
                .await
                .expect("server send");
            ws.send(WsMessage::Binary(vec![b's', b'o', b'w', 0xff]))
                .await
                .expect("server send binary");
            let reply = ws.next().await.expect("client frame").expect("valid frame");
            ws.close(None).await.expect("close");
            reply
        });

        let (service, mut rx) = ChatSocketService::new();
        service.spawn_session(SessionParams {
            client: test_client(),
            server_url: format!("http://{addr}"),
            generation: 7,
            cancel_token: CancellationToken::new(),
        });

        let (event, generation) = next_event(&mut rx).await;
        assert_eq!(generation, 7);
        let outbound = match event {
            SocketEvent::Opened {
                conversation_id,
                outbound,
            } => {
                assert_eq!(conversation_id, "c-17");
                outbound
            }
            other => panic!("expected Opened, got {other:?}"),
        };
        assert_eq!(path_rx.await.expect("path"), "/ws/c-17");

        match next_event(&mut rx).await {
            (SocketEvent::Frame(text), 7) => assert_eq!(text, "Plant **early**"),
            other => panic!("expected frame, got {other:?}"),
        }
        match next_event(&mut rx).await {
            (SocketEvent::Frame(text), 7) => assert_eq!(text, "sow\u{FFFD}"),
            other => panic!("expected lossy binary frame, got {other:?}"),
        }

        outbound.send("when to sow?".to_string()).expect("queue frame");
        let received = timeout(WAIT, server).await.expect("server done").expect("join");
        assert_eq!(received, WsMessage::Text("when to sow?".into()));

        match next_event(&mut rx).await {
            (SocketEvent::Closed, 7) => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_reports_single_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (service, mut rx) = ChatSocketService::new();
        service.spawn_session(SessionParams {
            client: test_client(),
            server_url: format!("http://{addr}"),
            generation: 2,
            cancel_token: CancellationToken::new(),
        });

        match next_event(&mut rx).await {
            (SocketEvent::Failed(message), 2) => {
                assert!(message.starts_with("could not create conversation"), "{message}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn non_success_status_fails_without_opening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (mut http, _) = listener.accept().await.expect("accept http");
            let _ = read_request_head(&mut http).await;
            http.write_all(
                b"HTTP/1.1 500 Internal Server Error\r\nconnection: close\r\ncontent-length: 4\r\n\r\nboom",
            )
            .await
            .expect("write");
        });

        let (service, mut rx) = ChatSocketService::new();
        service.spawn_session(SessionParams {
            client: test_client(),
            server_url: format!("http://{addr}"),
            generation: 1,
            cancel_token: CancellationToken::new(),
        });

        match next_event(&mut rx).await {
            (SocketEvent::Failed(message), 1) => assert!(message.contains("500"), "{message}"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
