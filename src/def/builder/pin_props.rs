// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! PINPROPERTIES

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{PropValue, Properties};
use crate::def::props::PropertySink;
use crate::error::ProtocolError;

enum Target {
    BTerm(String),
    ITerm { inst: String, pin: String },
}

pub struct PinPropsBuilder {
    base: BuilderBase,
    target: Slot<(Target, Properties)>,
}

impl Default for PinPropsBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            target: Slot::new("pin properties"),
        }
    }
}

impl_builder!(PinPropsBuilder);

impl PinPropsBuilder {
    fn reset_state(&mut self) {
        self.target.abandon();
    }

    /// `inst` is a component name, or `PIN` for a block pin
    pub fn begin(&mut self, s: &mut Session<'_>, inst: &str, pin: &str) -> Result<(), ProtocolError> {
        let problem = if inst == "PIN" {
            (!s.block.bterms.contains(pin)).then(|| format!("Pin {pin} not found"))
        } else {
            match s.block.insts.get(inst) {
                None => Some(format!("Component {inst} not found")),
                Some(i) if !i.terms.iter().any(|t| t == pin) => {
                    Some(format!("Component pin {inst}/{pin} not found"))
                }
                Some(_) => None,
            }
        };
        if let Some(msg) = problem {
            self.base.error(s, msg);
            return self.target.begin_discarded();
        }
        let target = if inst == "PIN" {
            Target::BTerm(pin.to_string())
        } else {
            Target::ITerm {
                inst: inst.to_string(),
                pin: pin.to_string(),
            }
        };
        self.target.begin((target, Properties::new()))
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        let Some((target, props)) = self.target.finish()? else {
            return Ok(());
        };
        match target {
            Target::BTerm(name) => {
                if let Some(term) = s.block.bterms.get_mut(&name) {
                    term.properties.extend(props);
                }
            }
            Target::ITerm { inst, pin } => {
                if let Some(inst) = s.block.insts.get_mut(&inst) {
                    inst.term_properties.entry(pin).or_default().extend(props);
                }
            }
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.target.abandon();
    }
}

impl PropertySink for PinPropsBuilder {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError> {
        if let Some((_, props)) = self.target.draft("property")? {
            props.insert(name.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;
    use crate::db::{BTerm, Inst};

    #[test]
    fn test_block_and_instance_pin_properties() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let _ = block.bterms.insert(BTerm {
            name: "clk".into(),
            ..Default::default()
        });
        let _ = block.insts.insert(Inst {
            name: "u1".into(),
            terms: vec!["A".into()],
            ..Default::default()
        });
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = PinPropsBuilder::default();
        b.init(1000);

        b.begin(&mut s, "PIN", "clk").unwrap();
        b.property_str("kind", "clock").unwrap();
        b.end(&mut s).unwrap();
        b.begin(&mut s, "u1", "A").unwrap();
        b.property_real("cap", 0.5).unwrap();
        b.end(&mut s).unwrap();
        b.begin(&mut s, "u1", "Z").unwrap();
        b.property_int("x", 1).unwrap();
        b.end(&mut s).unwrap();

        let clk = s.block.bterms.get("clk").unwrap();
        assert_eq!(clk.properties.get("kind"), Some(&PropValue::Str("clock".into())));
        let u1 = s.block.insts.get("u1").unwrap();
        assert_eq!(u1.term_properties["A"].get("cap"), Some(&PropValue::Real(0.5)));
        assert!(!u1.term_properties.contains_key("Z"));
        assert_eq!(b.errors(), 1);
    }
}
