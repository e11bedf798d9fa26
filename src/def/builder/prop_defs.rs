// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! PROPERTYDEFINITIONS
//!
//! Definitions are collected for the whole section and land in the block
//! property-definition table at `definitions_end`.

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{PropDefTable, PropDefinition, PropKind, PropValue};
use crate::error::ProtocolError;

const NAME: &str = "property definition";

/// Owner keywords a definition may attach to
pub const OBJECT_TYPES: [&str; 9] = [
    "COMPONENT",
    "COMPONENTPIN",
    "DESIGN",
    "GROUP",
    "NET",
    "NONDEFAULTRULE",
    "REGION",
    "ROW",
    "SPECIALNET",
];

struct Draft {
    owner: String,
    name: String,
    def: PropDefinition,
}

pub struct PropDefsBuilder {
    base: BuilderBase,
    section: Slot<PropDefTable>,
    def: Slot<Draft>,
    pub def_cnt: u32,
}

impl Default for PropDefsBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            section: Slot::new("property definitions"),
            def: Slot::new(NAME),
            def_cnt: 0,
        }
    }
}

impl_builder!(PropDefsBuilder);

impl PropDefsBuilder {
    fn reset_state(&mut self) {
        self.abandon();
        self.def_cnt = 0;
    }

    pub fn definitions_begin(&mut self) -> Result<(), ProtocolError> {
        self.section.begin(PropDefTable::new())
    }

    /// `object_type` is matched case-insensitively and stored uppercase
    pub fn begin(
        &mut self,
        s: &mut Session<'_>,
        object_type: &str,
        name: &str,
        kind: PropKind,
    ) -> Result<(), ProtocolError> {
        let owner = object_type.to_uppercase();
        let Some(section) = self.section.draft("begin")? else {
            return self.def.begin_discarded();
        };
        let duplicate = section.get(&owner).is_some_and(|t| t.contains_key(name))
            || s.block
                .prop_defs
                .get(&owner)
                .is_some_and(|t| t.contains_key(name));
        if !OBJECT_TYPES.contains(&owner.as_str()) {
            self.base.error(
                s,
                format!("Unknown object type {object_type} for property {name}"),
            );
            return self.def.begin_discarded();
        }
        if duplicate {
            self.base.error(
                s,
                format!("Property {name} for {owner} is already defined"),
            );
            return self.def.begin_discarded();
        }
        self.def.begin(Draft {
            owner,
            name: name.to_string(),
            def: PropDefinition {
                kind,
                value: None,
                range: None,
            },
        })
    }

    fn typed(kind: PropKind, n: f64) -> PropValue {
        match kind {
            PropKind::Integer => PropValue::Int(n as i32),
            PropKind::Real => PropValue::Real(n),
            PropKind::String => PropValue::Str(n.to_string()),
        }
    }

    fn set_value(&mut self, call: &'static str, value: impl FnOnce(PropKind) -> PropValue) -> Result<(), ProtocolError> {
        if let Some(d) = self.def.draft(call)? {
            if d.def.value.is_some() {
                return Err(ProtocolError::FieldAlreadySet {
                    builder: NAME,
                    field: "value",
                });
            }
            d.def.value = Some(value(d.def.kind));
        }
        Ok(())
    }

    /// Numeric default, stored in the declared kind
    pub fn number(&mut self, n: f64) -> Result<(), ProtocolError> {
        self.set_value("number", |kind| Self::typed(kind, n))
    }

    pub fn string(&mut self, v: &str) -> Result<(), ProtocolError> {
        self.set_value("string", |_| PropValue::Str(v.to_string()))
    }

    /// RANGE min max. INTEGER definitions keep integer bounds.
    pub fn range(&mut self, min: f64, max: f64) -> Result<(), ProtocolError> {
        if let Some(d) = self.def.draft("range")? {
            if d.def.range.is_some() {
                return Err(ProtocolError::FieldAlreadySet {
                    builder: NAME,
                    field: "range",
                });
            }
            d.def.range = Some(match d.def.kind {
                PropKind::Integer => (PropValue::Int(min as i32), PropValue::Int(max as i32)),
                _ => (PropValue::Real(min), PropValue::Real(max)),
            });
        }
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), ProtocolError> {
        let Some(d) = self.def.finish()? else {
            return Ok(());
        };
        if let Some(section) = self.section.draft("end")? {
            section.entry(d.owner).or_default().insert(d.name, d.def);
            self.def_cnt += 1;
        }
        Ok(())
    }

    pub fn definitions_end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if self.def.is_open() {
            return Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call: "definitions_end",
                requires: "end",
            });
        }
        if let Some(section) = self.section.finish()? {
            for (owner, defs) in section {
                s.block.prop_defs.entry(owner).or_default().extend(defs);
            }
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.def.abandon();
        self.section.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;

    #[test]
    fn test_definitions_commit_at_section_end() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PropDefsBuilder::default();
        b.init(1000);
        b.definitions_begin().unwrap();
        b.begin(&mut s, "component", "weight", PropKind::Integer).unwrap();
        b.range(1.0, 10.0).unwrap();
        b.number(5.0).unwrap();
        b.end().unwrap();
        b.begin(&mut s, "NET", "tag", PropKind::String).unwrap();
        b.string("x").unwrap();
        b.end().unwrap();
        assert!(s.block.prop_defs.is_empty());
        b.definitions_end(&mut s).unwrap();

        let def = &s.block.prop_defs["COMPONENT"]["weight"];
        assert_eq!(def.range, Some((PropValue::Int(1), PropValue::Int(10))));
        assert_eq!(def.value, Some(PropValue::Int(5)));
        assert_eq!(
            s.block.prop_defs["NET"]["tag"].value,
            Some(PropValue::Str("x".into()))
        );
        assert_eq!(b.def_cnt, 2);
    }

    #[test]
    fn test_range_twice_is_protocol_error() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PropDefsBuilder::default();
        b.definitions_begin().unwrap();
        b.begin(&mut s, "ROW", "r", PropKind::Real).unwrap();
        b.range(0.0, 1.0).unwrap();
        assert_eq!(
            b.range(0.0, 2.0),
            Err(ProtocolError::FieldAlreadySet {
                builder: NAME,
                field: "range"
            })
        );
    }

    #[test]
    fn test_unknown_owner_and_duplicate() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PropDefsBuilder::default();
        b.init(1000);
        b.definitions_begin().unwrap();
        b.begin(&mut s, "WIDGET", "a", PropKind::Real).unwrap();
        b.end().unwrap();
        b.begin(&mut s, "NET", "a", PropKind::Real).unwrap();
        b.end().unwrap();
        b.begin(&mut s, "net", "a", PropKind::Real).unwrap();
        b.end().unwrap();
        b.definitions_end(&mut s).unwrap();
        assert_eq!(b.errors(), 2);
        assert_eq!(s.block.prop_defs.len(), 1);
    }
}
