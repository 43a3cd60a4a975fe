//! Live WebSocket feed client.
//!
//! Each text frame that decodes as the feed's payload type replaces the
//! current snapshot. Outbound messages (votes, commands) are forwarded as
//! text frames. Returns when the stream ends so the caller can fall back to
//! simulation.

use serde::de::DeserializeOwned;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use super::FeedError;

#[cfg(feature = "live-feeds")]
pub(super) async fn follow<T>(
    endpoint: &str,
    connect_timeout: Duration,
    tx: &watch::Sender<Option<T>>,
    simulated: &AtomicBool,
    mut outbound: mpsc::UnboundedReceiver<String>,
) -> Result<(), FeedError>
where
    T: DeserializeOwned + Send + Sync,
{
    use futures_util::{SinkExt, StreamExt};
    use std::sync::atomic::Ordering;
    use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
    use tracing::{debug, info, warn};

    let connect_result = tokio::time::timeout(connect_timeout, connect_async(endpoint)).await;
    let (ws_stream, _) = match connect_result {
        Ok(Ok((stream, response))) => (stream, response),
        Ok(Err(e)) => return Err(FeedError::Connection(e.to_string())),
        Err(_) => return Err(FeedError::Timeout),
    };

    info!(endpoint, "Connected to live feed");
    simulated.store(false, Ordering::SeqCst);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<T>(&text) {
                            Ok(data) => {
                                tx.send_replace(Some(data));
                            }
                            Err(e) => debug!(endpoint, error = %e, "Ignoring unrecognized feed message"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await
                            .map_err(|e| FeedError::WebSocket(e.to_string()))?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!(endpoint, ?frame, "Live feed closed");
                        return Err(FeedError::StreamEnded);
                    }
                    Some(Err(e)) => return Err(FeedError::WebSocket(e.to_string())),
                    None => return Err(FeedError::StreamEnded),
                    _ => {}
                }
            }
            Some(message) = outbound.recv() => {
                write.send(Message::Text(message.into())).await
                    .map_err(|e| FeedError::WebSocket(e.to_string()))?;
            }
        }
    }
}

#[cfg(not(feature = "live-feeds"))]
pub(super) async fn follow<T>(
    _endpoint: &str,
    _connect_timeout: Duration,
    _tx: &watch::Sender<Option<T>>,
    _simulated: &AtomicBool,
    _outbound: mpsc::UnboundedReceiver<String>,
) -> Result<(), FeedError>
where
    T: DeserializeOwned + Send + Sync,
{
    Err(FeedError::Connection(
        "built without the live-feeds feature".to_string(),
    ))
}
