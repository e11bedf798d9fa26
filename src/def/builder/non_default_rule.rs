// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! NONDEFAULTRULES

use super::{impl_builder, BuilderBase, Session, Slot};
use crate::db::{LayerRule, NonDefaultRule, PropValue};
use crate::def::props::PropertySink;
use crate::error::ProtocolError;

const NAME: &str = "non-default rule";

pub struct NonDefaultRuleBuilder {
    base: BuilderBase,
    rule: Slot<NonDefaultRule>,
    layer: Slot<LayerRule>,
    pub rule_cnt: u32,
}

impl Default for NonDefaultRuleBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            rule: Slot::new(NAME),
            layer: Slot::new("non-default rule layer"),
            rule_cnt: 0,
        }
    }
}

impl_builder!(NonDefaultRuleBuilder);

impl NonDefaultRuleBuilder {
    fn reset_state(&mut self) {
        self.abandon();
        self.rule_cnt = 0;
    }

    fn reject(&mut self, s: &mut Session<'_>, msg: String) {
        self.base.error(s, msg);
        self.rule.discard();
        self.layer.discard();
    }

    fn rule_name(&mut self) -> String {
        match self.rule.draft("name") {
            Ok(Some(rule)) => rule.name.clone(),
            _ => String::new(),
        }
    }

    pub fn begin(&mut self, s: &mut Session<'_>, name: &str) -> Result<(), ProtocolError> {
        if s.block.non_default_rules.contains(name) {
            self.base
                .error(s, format!("Non-default rule {name} already exists"));
            return self.rule.begin_discarded();
        }
        self.rule.begin(NonDefaultRule {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn hard_spacing(&mut self) -> Result<(), ProtocolError> {
        if let Some(rule) = self.rule.draft("hard_spacing")? {
            rule.hard_spacing = true;
        }
        Ok(())
    }

    pub fn layer_begin(&mut self, s: &mut Session<'_>, layer: &str, width: i32) -> Result<(), ProtocolError> {
        if self.rule.draft("layer_begin")?.is_none() {
            return self.layer.begin_discarded();
        }
        if s.tech.find_layer(layer).is_none() {
            self.layer.begin_discarded()?;
            let msg = format!(
                "Layer {layer} referenced by non-default rule {} not found",
                self.rule_name()
            );
            self.reject(s, msg);
            return Ok(());
        }
        self.layer.begin(LayerRule {
            layer: layer.to_string(),
            width: self.base.dbdist(width),
            spacing: None,
            wire_ext: None,
        })
    }

    pub fn layer_spacing(&mut self, spacing: i32) -> Result<(), ProtocolError> {
        let v = self.base.dbdist(spacing);
        if let Some(layer) = self.layer.draft("layer_spacing")? {
            layer.spacing = Some(v);
        }
        Ok(())
    }

    pub fn layer_wire_ext(&mut self, ext: i32) -> Result<(), ProtocolError> {
        let v = self.base.dbdist(ext);
        if let Some(layer) = self.layer.draft("layer_wire_ext")? {
            layer.wire_ext = Some(v);
        }
        Ok(())
    }

    pub fn layer_end(&mut self) -> Result<(), ProtocolError> {
        if let Some(layer) = self.layer.finish()? {
            if let Some(rule) = self.rule.draft("layer_end")? {
                rule.layers.push(layer);
            }
        }
        Ok(())
    }

    pub fn via(&mut self, s: &mut Session<'_>, via: &str) -> Result<(), ProtocolError> {
        if self.rule.draft("via")?.is_none() {
            return Ok(());
        }
        if !s.block.has_via(s.tech, via) {
            let msg = format!(
                "Via {via} referenced by non-default rule {} not found",
                self.rule_name()
            );
            self.reject(s, msg);
            return Ok(());
        }
        if let Some(rule) = self.rule.draft("via")? {
            rule.vias.push(via.to_string());
        }
        Ok(())
    }

    pub fn via_rule(&mut self, s: &mut Session<'_>, via_rule: &str) -> Result<(), ProtocolError> {
        if self.rule.draft("via_rule")?.is_none() {
            return Ok(());
        }
        if !s.tech.has_via_rule(via_rule) {
            let msg = format!(
                "Via rule {via_rule} referenced by non-default rule {} not found",
                self.rule_name()
            );
            self.reject(s, msg);
            return Ok(());
        }
        if let Some(rule) = self.rule.draft("via_rule")? {
            rule.via_rules.push(via_rule.to_string());
        }
        Ok(())
    }

    pub fn min_cuts(&mut self, s: &mut Session<'_>, cut_layer: &str, cuts: i32) -> Result<(), ProtocolError> {
        if self.rule.draft("min_cuts")?.is_none() {
            return Ok(());
        }
        if s.tech.find_layer(cut_layer).is_none() {
            let msg = format!(
                "Layer {cut_layer} referenced by non-default rule {} not found",
                self.rule_name()
            );
            self.reject(s, msg);
            return Ok(());
        }
        if let Some(rule) = self.rule.draft("min_cuts")? {
            rule.min_cuts.push((cut_layer.to_string(), cuts));
        }
        Ok(())
    }

    pub fn end(&mut self, s: &mut Session<'_>) -> Result<(), ProtocolError> {
        if self.layer.is_open() {
            return Err(ProtocolError::OutOfOrder {
                builder: NAME,
                call: "end",
                requires: "layer_end",
            });
        }
        if let Some(rule) = self.rule.finish()? {
            self.rule_cnt += 1;
            let _ = s.block.non_default_rules.insert(rule);
        }
        Ok(())
    }

    pub fn abandon(&mut self) {
        self.layer.abandon();
        self.rule.abandon();
    }
}

impl PropertySink for NonDefaultRuleBuilder {
    fn set_property(&mut self, name: &str, value: PropValue) -> Result<(), ProtocolError> {
        if let Some(rule) = self.rule.draft("property")? {
            rule.properties.insert(name.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil;
    use super::super::Builder;
    use super::*;

    #[test]
    fn test_rule_with_layers_and_vias() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NonDefaultRuleBuilder::default();
        b.init(1000);
        b.begin(&mut s, "DOUBLE").unwrap();
        b.hard_spacing().unwrap();
        b.layer_begin(&mut s, "M1", 28).unwrap();
        b.layer_spacing(30).unwrap();
        b.layer_end().unwrap();
        b.via(&mut s, "VIA12").unwrap();
        b.via_rule(&mut s, "VIAGEN12").unwrap();
        b.min_cuts(&mut s, "V1", 2).unwrap();
        b.end(&mut s).unwrap();

        let rule = s.block.non_default_rules.get("DOUBLE").unwrap();
        assert!(rule.hard_spacing);
        assert_eq!(
            rule.layers,
            vec![LayerRule {
                layer: "M1".into(),
                width: 280,
                spacing: Some(300),
                wire_ext: None
            }]
        );
        assert_eq!(rule.vias, vec!["VIA12"]);
        assert_eq!(rule.min_cuts, vec![("V1".to_string(), 2)]);
    }

    #[test]
    fn test_unknown_layer_discards_rule() {
        let (tech, libs, mut block) = (testutil::tech(), testutil::libs(), testutil::block());
        let mut s = Session::new(&tech, &libs, &mut block);
        let mut b = NonDefaultRuleBuilder::default();
        b.init(1000);
        b.begin(&mut s, "R").unwrap();
        b.layer_begin(&mut s, "M5", 10).unwrap();
        b.layer_wire_ext(5).unwrap();
        b.layer_end().unwrap();
        b.end(&mut s).unwrap();
        assert!(s.block.non_default_rules.is_empty());
        assert_eq!(b.errors(), 1);
        assert!(s.notices[0].message.contains("non-default rule R"));
    }
}
