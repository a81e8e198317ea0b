//! Length-prefixed JSON framing over the control byte stream.
//!
//! Every message travels as a 4-byte little-endian length followed by that
//! many bytes of UTF-8 JSON, in both directions.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use crate::errors::BridgeResult;
use crate::router::{DispatchRouter, Outbound};

pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;
const WRITER_DRAIN: Duration = Duration::from_secs(1);

pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .little_endian()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

/// Feeds inbound messages to `router` one at a time, in arrival order, and
/// writes whatever it sends back. A router that needs to wait on a browser
/// spawns that work so later frames are not held up. Returns when the inbound
/// side closes; the caller then owns shutdown.
pub async fn run<R, W>(reader: R, writer: W, router: Arc<dyn DispatchRouter>) -> BridgeResult<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, rx) = Outbound::channel();
    let mut writer_task = tokio::spawn(write_frames(FramedWrite::new(writer, frame_codec()), rx));

    let inbound = read_frames(
        FramedRead::new(reader, frame_codec()),
        router.as_ref(),
        &outbound,
    )
    .await;
    drop(outbound);

    // Routers may still hold outbound clones; give queued replies a moment.
    match tokio::time::timeout(WRITER_DRAIN, &mut writer_task).await {
        Ok(Ok(Err(err))) => warn!(%err, "outbound stream failed"),
        Ok(Err(err)) => warn!(?err, "outbound writer task failed"),
        Ok(Ok(Ok(()))) => {}
        Err(_) => {
            debug!("outbound writer still busy; abandoning");
            writer_task.abort();
        }
    }
    info!("control stream closed");
    inbound
}

async fn read_frames<R>(
    mut frames: FramedRead<R, LengthDelimitedCodec>,
    router: &dyn DispatchRouter,
    outbound: &Outbound,
) -> BridgeResult<()>
where
    R: AsyncRead + Unpin,
{
    while let Some(frame) = frames.next().await {
        let frame = frame?;
        let message: Value = match serde_json::from_slice(&frame) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, len = frame.len(), "skipping malformed frame");
                continue;
            }
        };
        if let Err(err) = router.dispatch(message, outbound).await {
            warn!(%err, "dispatch failed");
        }
    }
    Ok(())
}

async fn write_frames<W>(
    mut sink: FramedWrite<W, LengthDelimitedCodec>,
    mut rx: mpsc::UnboundedReceiver<Value>,
) -> BridgeResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let payload = serde_json::to_vec(&message)?;
        sink.send(Bytes::from(payload)).await?;
    }
    SinkExt::<Bytes>::close(&mut sink).await?;
    Ok(())
}
