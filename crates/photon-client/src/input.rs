// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local input events and the line-oriented command script that produces
// them.
//
//   move x y        cursor to (x, y)
//   click x y       cursor to (x, y), then click
//   wheel dx dy     wheel by lines at the cursor
//   wheel-px dx dy  wheel by pixels at the cursor
//   quit            end the session

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use photon_core::Point;
use photon_core::error::{PhotonError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelDelta {
    Line(f32, f32),
    Pixel(f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    CursorMoved(Point),
    Click,
    Wheel(WheelDelta),
    Close,
}

fn coords(cmd: &str, args: &[&str]) -> Result<(f32, f32)> {
    match args {
        [x, y] => {
            let parse = |s: &str| {
                s.parse::<f32>()
                    .map_err(|e| PhotonError::Input(format!("{cmd}: bad number {s:?}: {e}")))
            };
            Ok((parse(x)?, parse(y)?))
        }
        _ => Err(PhotonError::Input(format!("{cmd}: expected 2 numbers, got {}", args.len()))),
    }
}

/// Parse one command line.  Blank lines and `#` comments yield no events.
pub fn parse_command(line: &str) -> Result<Vec<InputEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }
    let mut words = line.split_whitespace();
    let cmd = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match cmd {
        "move" => {
            let (x, y) = coords(cmd, &args)?;
            Ok(vec![InputEvent::CursorMoved(Point::new(x, y))])
        }
        "click" => {
            let (x, y) = coords(cmd, &args)?;
            Ok(vec![InputEvent::CursorMoved(Point::new(x, y)), InputEvent::Click])
        }
        "wheel" => {
            let (dx, dy) = coords(cmd, &args)?;
            Ok(vec![InputEvent::Wheel(WheelDelta::Line(dx, dy))])
        }
        "wheel-px" => {
            let (dx, dy) = coords(cmd, &args)?;
            Ok(vec![InputEvent::Wheel(WheelDelta::Pixel(dx, dy))])
        }
        "quit" if args.is_empty() => Ok(vec![InputEvent::Close]),
        other => Err(PhotonError::Input(format!("unknown command {other:?}"))),
    }
}

/// Read commands from `reader` until EOF, `quit`, or the receiver goes away.
///
/// Unparseable lines are logged and skipped.
pub async fn forward_commands<R>(reader: R, tx: mpsc::Sender<InputEvent>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let events = match parse_command(&line) {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "ignoring input line");
                continue;
            }
        };
        for event in events {
            if tx.send(event).await.is_err() {
                debug!("input receiver closed");
                return Ok(());
            }
            if event == InputEvent::Close {
                return Ok(());
            }
        }
    }
    debug!("input script finished");
    Ok(())
}
