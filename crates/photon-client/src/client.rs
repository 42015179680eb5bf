// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Connection to the UI server and the session loop.
//
// A session owns one TCP stream.  A reader task turns the inbound half into
// whole frames; the session loop selects between those frames and local
// input, applying frames to the engine and writing callbacks to the outbound
// half.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use photon_core::PhotonConfig;
use photon_core::error::{PhotonError, Result};
use photon_protocol::{HANDSHAKE, read_frame};

use crate::controller::Controller;
use crate::engine::{SharedEngine, lock_engine};
use crate::input::InputEvent;
use crate::retry::{RetryConfig, RetryDecision, should_retry};
use crate::sink::FrameSink;

/// Frames buffered between the reader task and the session loop.
const FRAME_QUEUE: usize = 16;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the stream on a frame boundary.
    ServerClosed,
    /// Local input asked to close.
    Closed,
}

/// Connect to the configured server, retrying transient failures, and send
/// the handshake.
pub async fn connect_with_retry(config: &PhotonConfig) -> Result<TcpStream> {
    let addr = config.server_addr();
    let retry = RetryConfig::from_config(config);
    let mut attempt = 0u32;

    loop {
        let err = match TcpStream::connect(addr.as_str()).await {
            Ok(mut stream) => {
                handshake(&mut stream).await?;
                info!(%addr, attempt, "connected to UI server");
                return Ok(stream);
            }
            Err(e) => PhotonError::Io(e),
        };

        match should_retry(&err, attempt, &retry) {
            RetryDecision::RetryAfter(delay) => {
                warn!(%addr, attempt, error = %err, delay_ms = delay.as_millis(), "connect failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            RetryDecision::GiveUp | RetryDecision::Exhausted => {
                error!(%addr, attempt, error = %err, "giving up on connection");
                return Err(PhotonError::Connection(format!("{addr}: {err}")));
            }
        }
    }
}

/// Disable Nagle and identify as a renderer.
pub async fn handshake(stream: &mut TcpStream) -> Result<()> {
    stream.set_nodelay(true)?;
    stream.write_all(HANDSHAKE).await?;
    stream.flush().await?;
    debug!("handshake sent");
    Ok(())
}

/// Run one session until the server closes the stream or input asks to
/// close.
///
/// A message that does not decode is logged and dropped; the session keeps
/// going.  Framing and I/O errors end the session with an error.
pub async fn run_session<S>(
    stream: TcpStream,
    engine: SharedEngine,
    sink: &mut S,
    mut input: mpsc::Receiver<InputEvent>,
) -> Result<SessionEnd>
where
    S: FrameSink + ?Sized,
{
    let max_frame_bytes = lock_engine(&engine).config().max_frame_bytes;
    let (mut reader, mut writer) = stream.into_split();

    let (frame_tx, mut frames) = mpsc::channel::<Result<Option<Vec<u8>>>>(FRAME_QUEUE);
    let reader_task = tokio::spawn(async move {
        loop {
            let result = read_frame(&mut reader, max_frame_bytes).await;
            let done = !matches!(result, Ok(Some(_)));
            if frame_tx.send(result).await.is_err() || done {
                break;
            }
        }
    });

    let mut controller = Controller::new(engine.clone());
    let mut input_open = true;

    let end = loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(Ok(Some(payload))) => present(&engine, sink, &payload)?,
                    Some(Ok(None)) | None => {
                        info!("server closed the connection");
                        break SessionEnd::ServerClosed;
                    }
                    Some(Err(e)) => {
                        reader_task.abort();
                        return Err(e);
                    }
                }
            }

            event = input.recv(), if input_open => {
                match event {
                    Some(event) => {
                        if !controller.handle(event, &mut writer).await? {
                            info!("session closed by input");
                            break SessionEnd::Closed;
                        }
                    }
                    None => {
                        debug!("input channel closed");
                        input_open = false;
                    }
                }
            }
        }
    };

    reader_task.abort();
    let _ = writer.shutdown().await;
    Ok(end)
}

/// Apply one frame payload and hand the result to the sink.
fn present<S>(engine: &SharedEngine, sink: &mut S, payload: &[u8]) -> Result<()>
where
    S: FrameSink + ?Sized,
{
    let frame = match lock_engine(engine).apply_message(payload) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, bytes = payload.len(), "dropping undecodable message");
            return Ok(());
        }
    };
    sink.present(&frame)?;
    lock_engine(engine).frame_presented(&frame);
    Ok(())
}
