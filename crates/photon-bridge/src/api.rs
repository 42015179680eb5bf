// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operations behind the JNI exports, callable from Rust.

use std::sync::{Mutex, Once, OnceLock};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use photon_client::{Engine, FrameSink, SessionEnd, SharedEngine, connect_with_retry, lock_engine, run_session, sink_from_config};
use photon_core::PhotonConfig;
use photon_core::error::{PhotonError, Result};

static ENGINE: OnceLock<SharedEngine> = OnceLock::new();
static LOCAL_SINK: OnceLock<Mutex<Box<dyn FrameSink>>> = OnceLock::new();
static LOGGING: Once = Once::new();

/// Install the tracing subscriber once.  A subscriber the host already
/// installed is left alone.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .try_init();
    });
}

/// The process-global engine, created from `$PHOTON_CONFIG` on first use.
pub fn global_engine() -> Result<SharedEngine> {
    if let Some(engine) = ENGINE.get() {
        return Ok(engine.clone());
    }
    let config = PhotonConfig::from_env()?;
    let engine = Engine::new(config)?.shared();
    Ok(ENGINE.get_or_init(|| engine).clone())
}

/// Sink for frames produced by in-process `applyUpdates` calls.
fn local_sink(config: &PhotonConfig) -> Result<&'static Mutex<Box<dyn FrameSink>>> {
    if let Some(sink) = LOCAL_SINK.get() {
        return Ok(sink);
    }
    let sink = sink_from_config(config)?;
    Ok(LOCAL_SINK.get_or_init(|| Mutex::new(sink)))
}

/// Connect to the UI server on `localhost:port` and serve the session until
/// it ends.
///
/// Blocks the calling thread on a dedicated multi-threaded runtime.
#[instrument]
pub fn run_blocking(port: i32) -> Result<SessionEnd> {
    let port = u16::try_from(port).map_err(|_| PhotonError::Config(format!("port {port} out of range")))?;
    let engine = global_engine()?;
    let config = PhotonConfig {
        host: "localhost".into(),
        port,
        ..lock_engine(&engine).config().clone()
    };
    serve_blocking(engine, config)
}

/// Serve one session for `engine`, starting from an empty DOM.
fn serve_blocking(engine: SharedEngine, config: PhotonConfig) -> Result<SessionEnd> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("photon-session")
        .build()?;

    runtime.block_on(async move {
        let stream = connect_with_retry(&config).await?;
        // A new server knows nothing of the previous session's nodes.
        lock_engine(&engine).reset();
        let mut sink = sink_from_config(&config)?;
        // No local input source; the server drives everything.
        let (_input, input_rx) = mpsc::channel(1);
        let end = run_session(stream, engine, &mut sink, input_rx).await?;
        info!(?end, "session finished");
        Ok::<_, PhotonError>(end)
    })
}

/// Apply an update message in-process, exactly as if the server had sent it.
///
/// Unlike a streamed message, one that does not decode is an error for the
/// caller.
pub fn apply_updates_json(updates: &str) -> Result<u64> {
    let engine = global_engine()?;
    let (frame, config) = {
        let mut engine = lock_engine(&engine);
        (engine.apply_message(updates.as_bytes())?, engine.config().clone())
    };

    local_sink(&config)?
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .present(&frame)?;
    lock_engine(&engine).frame_presented(&frame);
    debug!(epoch = frame.epoch, "in-process updates applied");
    Ok(frame.epoch)
}

/// Width of `text` laid out with the global engine's font.
pub fn measure_text(text: &str) -> Result<f32> {
    let engine = global_engine()?;
    let width = lock_engine(&engine).measure_text(text);
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    // All tests share the global engine, so each uses its own node ids.

    #[test]
    fn global_engine_is_a_singleton() {
        let a = global_engine().unwrap();
        let b = global_engine().unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn applies_updates_to_the_global_engine() {
        let before = apply_updates_json("[]").unwrap();
        let after = apply_updates_json(r#"[{"update-type":"make-node","type":"div","node":9001}]"#).unwrap();
        assert!(after > before);
        assert!(lock_engine(&global_engine().unwrap()).dom().get(9001).is_some());
    }

    #[test]
    fn malformed_updates_are_rejected() {
        assert!(matches!(apply_updates_json("{not an array"), Err(PhotonError::Protocol(_))));
    }

    #[test]
    fn measures_with_the_configured_font_size() {
        // Fallback face at the default 14px: 0.6em per char.
        let width = measure_text("abcde").unwrap();
        assert!((width - 42.0).abs() < 1e-3);
        assert_eq!(measure_text("").unwrap(), 0.0);
    }

    #[test]
    fn each_session_starts_with_an_empty_dom() {
        use std::io::{Read, Write};

        let engine = Engine::new(PhotonConfig::default()).unwrap().shared();
        lock_engine(&engine)
            .apply_message(br#"[{"update-type":"make-node","type":"div","node":77}]"#)
            .unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut hello = vec![0u8; photon_protocol::HANDSHAKE.len()];
            stream.read_exact(&mut hello).unwrap();
            let message = br#"[{"update-type":"make-node","type":"div","node":78}]"#;
            stream.write_all(&photon_protocol::encode_frame(message).unwrap()).unwrap();
        });

        let config = PhotonConfig {
            host: "127.0.0.1".into(),
            port,
            connect_max_retries: 1,
            ..Default::default()
        };
        let end = serve_blocking(engine.clone(), config).unwrap();
        server.join().unwrap();

        assert_eq!(end, SessionEnd::ServerClosed);
        let engine = lock_engine(&engine);
        assert!(engine.dom().get(77).is_none());
        assert!(engine.dom().get(78).is_some());
    }

    #[test]
    fn out_of_range_port_is_a_config_error() {
        assert!(matches!(run_blocking(70_000), Err(PhotonError::Config(_))));
        assert!(matches!(run_blocking(-1), Err(PhotonError::Config(_))));
    }
}
