use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{BridgeError, BridgeResult};

/// Sending half of the control stream. Cloneable; messages are framed and
/// written in the order they are sent.
#[derive(Clone, Debug)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<Value>,
}

impl Outbound {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, message: Value) -> BridgeResult<()> {
        self.tx.send(message).map_err(|_| BridgeError::Closed)
    }
}

/// Receives every decoded inbound message.
///
/// The transport awaits `dispatch` before reading the next frame, so an
/// implementation must return promptly: work that waits on a browser is
/// spawned and answers later through a clone of `outbound`.
#[async_trait]
pub trait DispatchRouter: Send + Sync {
    async fn dispatch(&self, message: Value, outbound: &Outbound) -> BridgeResult<()>;
}

/// Router used when no protocol dispatcher is attached: every request gets an
/// error response, notifications are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectingRouter;

#[async_trait]
impl DispatchRouter for RejectingRouter {
    async fn dispatch(&self, message: Value, outbound: &Outbound) -> BridgeResult<()> {
        let Some(id) = message.get("id").cloned() else {
            debug!("dropping notification without id");
            return Ok(());
        };
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or("<none>");
        outbound.send(json!({
            "id": id,
            "error": {
                "error": {
                    "name": "Error",
                    "message": format!("no dispatcher for method {method}"),
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_gets_error_response() {
        let (outbound, mut rx) = Outbound::channel();
        RejectingRouter
            .dispatch(json!({ "id": 7, "guid": "", "method": "initialize" }), &outbound)
            .await
            .unwrap();

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply["id"], 7);
        assert_eq!(
            reply["error"]["error"]["message"],
            "no dispatcher for method initialize"
        );
    }

    #[tokio::test]
    async fn notification_is_dropped() {
        let (outbound, mut rx) = Outbound::channel();
        RejectingRouter
            .dispatch(json!({ "method": "ping" }), &outbound)
            .await
            .unwrap();
        drop(outbound);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn send_after_receiver_drop_reports_closed() {
        let (outbound, rx) = Outbound::channel();
        drop(rx);
        assert!(matches!(outbound.send(json!({})), Err(BridgeError::Closed)));
    }
}
