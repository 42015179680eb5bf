// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed readers for attribute values carried in updates.

use serde_json::Value;

use photon_core::error::{PhotonError, Result};
use photon_core::{Color, NodeId, Point, Rect, rect};

fn field_f32(value: &Value, name: &str) -> Result<f32> {
    value[name]
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| PhotonError::Protocol(format!("expected number field {name:?} in {value}")))
}

fn field_u8(value: &Value, name: &str) -> Result<u8> {
    value[name]
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| PhotonError::Protocol(format!("expected byte field {name:?} in {value}")))
}

/// `{"x", "y", "width", "height"}`.
pub fn parse_rect(value: &Value) -> Result<Rect> {
    Ok(rect(
        field_f32(value, "x")?,
        field_f32(value, "y")?,
        field_f32(value, "width")?,
        field_f32(value, "height")?,
    ))
}

/// `{"x", "y"}`.
pub fn parse_point(value: &Value) -> Result<Point> {
    Ok(Point::new(field_f32(value, "x")?, field_f32(value, "y")?))
}

/// `{"r", "g", "b", "a"}` with 8-bit channels.
pub fn parse_color(value: &Value) -> Result<Color> {
    Ok(Color::from_rgba8(
        field_u8(value, "r")?,
        field_u8(value, "g")?,
        field_u8(value, "b")?,
        field_u8(value, "a")?,
    ))
}

pub fn parse_string(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| PhotonError::Protocol(format!("expected string, got {value}")))
}

pub fn parse_node_id(value: &Value) -> Result<NodeId> {
    value
        .as_u64()
        .ok_or_else(|| PhotonError::Protocol(format!("expected node id, got {value}")))
}
