// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Length-prefixed framing for server -> renderer messages.
//
// ```text
// length:  4 bytes (big-endian u32)
// payload: length bytes (UTF-8 JSON)
// ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use photon_core::error::{PhotonError, Result};

/// Bytes the renderer sends right after connecting so the server knows which
/// kind of client it is talking to.  Not valid JSON; servers match it verbatim.
pub const HANDSHAKE: &[u8] = b"{kind : \"webrender\"}";

/// Size of the length prefix.
const LENGTH_PREFIX_BYTES: usize = 4;

/// Prefix `payload` with its big-endian length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        PhotonError::Framing(format!("payload of {} bytes exceeds u32 length", payload.len()))
    })?;
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Read one frame.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly on a frame
/// boundary.  A stream that ends inside the prefix or the payload, or a
/// length above `max_bytes`, is a framing error.
pub async fn read_frame<R>(reader: &mut R, max_bytes: usize) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_BYTES {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(PhotonError::Framing(format!(
                "stream closed after {filled} of {LENGTH_PREFIX_BYTES} length bytes"
            )));
        }
        filled += n;
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_bytes {
        return Err(PhotonError::Framing(format!(
            "frame of {len} bytes exceeds limit of {max_bytes}"
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            PhotonError::Framing(format!("stream closed inside a {len}-byte payload"))
        }
        _ => PhotonError::Io(e),
    })?;
    trace!(len, "frame received");
    Ok(Some(payload))
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
