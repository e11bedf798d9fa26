// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Typed property transfer onto whichever builder owns the property list

use super::{DefPropKind, DefProperty};
use crate::db::PropValue;
use crate::error::ProtocolError;

/// Builder that accepts properties for its open entity
pub trait PropertySink {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError>;

    fn property_real(&mut self, name: &str, value: f64) -> Result<(), ProtocolError> {
        self.set_property(name, PropValue::Real(value))
    }

    fn property_int(&mut self, name: &str, value: i32) -> Result<(), ProtocolError> {
        self.set_property(name, PropValue::Int(value))
    }

    fn property_str(&mut self, name: &str, value: &str) -> Result<(), ProtocolError> {
        self.set_property(name, PropValue::Str(value.to_string()))
    }
}

/// Dispatch each property to the setter selected by its declared kind.
///
/// S, N and Q all land as strings. A numeric kind whose text is not a
/// number is kept as a string.
pub fn transfer_props<S: PropertySink + ?Sized>(
    sink: &mut S,
    props: &[DefProperty],
) -> Result<(), ProtocolError> {
    for prop in props {
        match (prop.kind, prop.number) {
            (DefPropKind::Real, Some(n)) => sink.property_real(&prop.name, n)?,
            (DefPropKind::Integer, Some(n)) => sink.property_int(&prop.name, n as i32)?,
            _ => sink.property_str(&prop.name, &prop.value)?,
        }
    }
    Ok(())
}
