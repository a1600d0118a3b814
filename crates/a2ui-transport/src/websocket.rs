//! WebSocket connector.

use a2ui_core::{Connection, Connector, TransportError};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

/// Connector for `ws://` and `wss://` endpoints.
///
/// `wss://` requires the `tls` feature.
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl WsConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Connection, TransportError> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(format!("WebSocket connection error: {e}")))?;

        let (sink, stream) = ws_stream.split();

        let sink = sink
            .sink_map_err(|e| TransportError::Io(e.to_string()))
            .with(|text: String| future::ready(Ok::<_, TransportError>(Message::text(text))));

        let stream = stream.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => String::from_utf8(data.to_vec()).ok().map(Ok),
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::Io(e.to_string()))),
            })
        });

        Ok(Connection::new(Box::pin(sink), Box::pin(stream)))
    }
}
