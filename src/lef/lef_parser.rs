// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

use log::{debug, warn};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_until},
    character::complete::{char, multispace0},
    combinator::all_consuming,
    multi::many0,
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::db::{
    Int, IoType, Layer, LayerDirection, LayerKind, Library, MTerm, Master, SigType, Site, Tech,
    TechVia,
};
use crate::error::LefError;
use crate::utils::EnumStr;

const DEFAULT_DBU: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tok<'a> {
    text: &'a str,
    line: usize,
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"')).parse(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace() || c == ';').parse(input)
}

fn line_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(delimited(
        multispace0,
        many0(preceded(multispace0, alt((tag(";"), quoted, word)))),
        multispace0,
    ))
    .parse(input)
}

fn strip_comment(line: &str) -> &str {
    let mut in_quote = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            '#' if !in_quote => return &line[..i],
            _ => {}
        }
    }
    line
}

fn tokenize(text: &str) -> Result<Vec<Tok<'_>>, LefError> {
    let mut toks = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        let (_, words) = line_tokens(line).map_err(|_| LefError::Syntax {
            line: i + 1,
            msg: "Unterminated string".into(),
        })?;
        toks.extend(words.into_iter().map(|text| Tok { text, line: i + 1 }));
    }
    Ok(toks)
}

struct Cursor<'a> {
    toks: Vec<Tok<'a>>,
    pos: usize,
    dbu: u32,
}

impl<'a> Cursor<'a> {
    fn line(&self) -> usize {
        self.toks
            .get(self.pos)
            .or_else(|| self.toks.last())
            .map_or(0, |t| t.line)
    }

    fn err(&self, msg: impl Into<String>) -> LefError {
        LefError::Syntax {
            line: self.line(),
            msg: msg.into(),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.toks.get(self.pos).map(|t| t.text)
    }

    fn next(&mut self, what: &str) -> Result<&'a str, LefError> {
        let tok = self
            .toks
            .get(self.pos)
            .ok_or_else(|| self.err(format!("Unexpected end of file, expected {what}")))?;
        self.pos += 1;
        Ok(tok.text)
    }

    fn keyword(&mut self, what: &str) -> Result<String, LefError> {
        Ok(self.next(what)?.to_ascii_uppercase())
    }

    fn eat(&mut self, kw: &str) -> bool {
        if self.peek().is_some_and(|t| t.eq_ignore_ascii_case(kw)) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn number(&mut self, what: &str) -> Result<f64, LefError> {
        let text = self.next(what)?;
        match double::<&str, nom::error::Error<&str>>(text) {
            Ok(("", v)) => Ok(v),
            _ => Err(self.err(format!("Expected number for {what}, found `{text}`"))),
        }
    }

    /// Microns to database units
    fn distance(&mut self, what: &str) -> Result<Int, LefError> {
        let microns = self.number(what)?;
        Ok((microns * f64::from(self.dbu)).round() as Int)
    }

    fn skip_statement(&mut self) {
        while let Some(t) = self.peek() {
            self.pos += 1;
            if t == ";" {
                break;
            }
        }
    }

    fn end_statement(&mut self) {
        if self.peek() == Some(";") {
            self.pos += 1;
        } else {
            self.skip_statement();
        }
    }

    /// Consumes `END name` and returns true when it is next
    fn at_end_of(&mut self, name: &str) -> Result<bool, LefError> {
        if self.peek().is_none() {
            return Err(self.err(format!("Unexpected end of file, expected END {name}")));
        }
        if self.peek().is_some_and(|t| t.eq_ignore_ascii_case("END"))
            && self
                .toks
                .get(self.pos + 1)
                .is_some_and(|t| t.text == name)
        {
            self.pos += 2;
            return Ok(true);
        }
        Ok(false)
    }

    /// Skips a block closed by a bare `END`
    fn skip_anonymous_block(&mut self) -> Result<(), LefError> {
        loop {
            match self.peek() {
                None => return Err(self.err("Unexpected end of file, expected END")),
                Some(t) if t.eq_ignore_ascii_case("END") => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.skip_statement(),
            }
        }
    }
}

fn units(c: &mut Cursor<'_>) -> Result<Option<u32>, LefError> {
    let mut dbu = None;
    while !c.at_end_of("UNITS")? {
        if c.eat("DATABASE") {
            if !c.eat("MICRONS") {
                return Err(c.err("Expected MICRONS after DATABASE"));
            }
            let value = c.number("DATABASE MICRONS")?;
            if value < 1.0 {
                return Err(c.err(format!("Invalid DATABASE MICRONS {value}")));
            }
            dbu = Some(value as u32);
            c.end_statement();
        } else {
            c.skip_statement();
        }
    }
    Ok(dbu)
}

fn layer(c: &mut Cursor<'_>) -> Result<Layer, LefError> {
    let name = c.next("LAYER name")?.to_string();
    let mut kind = None;
    let mut width = 0;
    let mut direction = None;
    while !c.at_end_of(&name)? {
        let kw = c.keyword("layer statement")?;
        match kw.as_str() {
            "TYPE" => {
                let text = c.next("layer TYPE")?;
                kind = Some(
                    LayerKind::parse(text)
                        .ok_or_else(|| c.err(format!("Unknown layer TYPE {text}")))?,
                );
                c.end_statement();
            }
            "WIDTH" => {
                width = c.distance("layer WIDTH")?;
                c.end_statement();
            }
            "DIRECTION" => {
                let text = c.next("layer DIRECTION")?;
                direction = LayerDirection::parse(text);
                if direction.is_none() {
                    debug!("layer {name}: ignoring DIRECTION {text}");
                }
                c.end_statement();
            }
            _ => {
                if kw != ";" {
                    c.skip_statement();
                }
            }
        }
    }
    let kind = kind.ok_or_else(|| c.err(format!("Layer {name} has no TYPE")))?;
    Ok(Layer {
        name,
        kind,
        width,
        direction,
    })
}

fn via(c: &mut Cursor<'_>) -> Result<TechVia, LefError> {
    let name = c.next("VIA name")?.to_string();
    c.eat("DEFAULT");
    let mut via = TechVia {
        name,
        layers: Vec::new(),
    };
    while !c.at_end_of(&via.name)? {
        if c.eat("LAYER") {
            let layer = c.next("via LAYER")?.to_string();
            if !via.layers.contains(&layer) {
                via.layers.push(layer);
            }
        }
        c.skip_statement();
    }
    Ok(via)
}

/// Name of a `VIARULE name GENERATE` rule; other via rules yield None
fn via_rule(c: &mut Cursor<'_>) -> Result<Option<String>, LefError> {
    let name = c.next("VIARULE name")?.to_string();
    let generate = c.eat("GENERATE");
    c.eat("DEFAULT");
    while !c.at_end_of(&name)? {
        c.skip_statement();
    }
    Ok(generate.then_some(name))
}

fn size(c: &mut Cursor<'_>) -> Result<(Int, Int), LefError> {
    let w = c.distance("SIZE width")?;
    if !c.eat("BY") {
        return Err(c.err("Expected BY in SIZE"));
    }
    let h = c.distance("SIZE height")?;
    c.end_statement();
    Ok((w, h))
}

fn class(c: &mut Cursor<'_>) -> Result<String, LefError> {
    let mut words = Vec::new();
    while let Some(t) = c.peek() {
        if t == ";" {
            break;
        }
        words.push(c.keyword("CLASS")?);
    }
    c.end_statement();
    Ok(words.join(" "))
}

fn site(c: &mut Cursor<'_>) -> Result<Site, LefError> {
    let mut site = Site {
        name: c.next("SITE name")?.to_string(),
        ..Default::default()
    };
    while !c.at_end_of(&site.name)? {
        if c.eat("CLASS") {
            site.class = Some(class(c)?);
        } else if c.eat("SIZE") {
            (site.width, site.height) = size(c)?;
        } else {
            c.skip_statement();
        }
    }
    Ok(site)
}

fn pin(c: &mut Cursor<'_>) -> Result<MTerm, LefError> {
    let mut pin = MTerm {
        name: c.next("PIN name")?.to_string(),
        ..Default::default()
    };
    while !c.at_end_of(&pin.name)? {
        let kw = c.keyword("pin statement")?;
        match kw.as_str() {
            "DIRECTION" => {
                let text = c.next("DIRECTION")?;
                pin.io_type = IoType::parse(text);
                c.end_statement();
            }
            "USE" => {
                let text = c.next("USE")?;
                pin.sig_type = SigType::parse(text);
                c.end_statement();
            }
            "PORT" => {
                if c.peek() == Some(";") {
                    c.next(";")?;
                }
                c.skip_anonymous_block()?;
            }
            ";" => {}
            _ => c.skip_statement(),
        }
    }
    Ok(pin)
}

fn macro_(c: &mut Cursor<'_>) -> Result<Master, LefError> {
    let mut master = Master {
        name: c.next("MACRO name")?.to_string(),
        ..Default::default()
    };
    while !c.at_end_of(&master.name)? {
        let kw = c.keyword("macro statement")?;
        match kw.as_str() {
            "CLASS" => master.class = Some(class(c)?),
            "SIZE" => (master.width, master.height) = size(c)?,
            "PIN" => {
                let pin = pin(c)?;
                master.pins.push(pin);
            }
            "OBS" => c.skip_anonymous_block()?,
            ";" => {}
            _ => c.skip_statement(),
        }
    }
    Ok(master)
}

/// Parses LEF text into the technology and a library named `lib_name`
pub fn parse_lef(text: &str, lib_name: &str) -> Result<(Tech, Library), LefError> {
    let mut c = Cursor {
        toks: tokenize(text)?,
        pos: 0,
        dbu: DEFAULT_DBU,
    };
    let mut tech = Tech::default();
    let mut lib = Library {
        name: lib_name.to_string(),
        ..Default::default()
    };
    let mut units_seen = false;

    while let Some(tok) = c.peek() {
        let kw = tok.to_ascii_uppercase();
        c.pos += 1;
        match kw.as_str() {
            "UNITS" => {
                if let Some(dbu) = units(&mut c)? {
                    c.dbu = dbu;
                    units_seen = true;
                }
            }
            "LAYER" => {
                let layer = layer(&mut c)?;
                if let Err(dup) = tech.layers.insert(layer) {
                    warn!("duplicate LEF layer {} ignored", dup.name);
                }
            }
            "VIA" => {
                let via = via(&mut c)?;
                if let Err(dup) = tech.vias.insert(via) {
                    warn!("duplicate LEF via {} ignored", dup.name);
                }
            }
            "VIARULE" => {
                if let Some(rule) = via_rule(&mut c)? {
                    tech.via_rules.push(rule);
                }
            }
            "SITE" => {
                let site = site(&mut c)?;
                if let Err(dup) = lib.sites.insert(site) {
                    warn!("duplicate LEF site {} ignored", dup.name);
                }
            }
            "MACRO" => {
                let master = macro_(&mut c)?;
                if let Err(dup) = lib.masters.insert(master) {
                    warn!("duplicate LEF macro {} ignored", dup.name);
                }
            }
            "END" => {
                if c.eat("LIBRARY") {
                    break;
                }
                let _ = c.next("END name");
            }
            ";" => {}
            _ => {
                debug!("skipping LEF statement {kw}");
                c.skip_statement();
            }
        }
    }

    if !units_seen {
        warn!("LEF has no UNITS DATABASE MICRONS, using {DEFAULT_DBU}");
    }
    tech.dbu_per_micron = c.dbu;
    Ok((tech, lib))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEF: &str = r#"
VERSION 5.8 ;
BUSBITCHARS "[]" ;
UNITS
  DATABASE MICRONS 2000 ;
END UNITS

LAYER M1
  TYPE ROUTING ;
  DIRECTION HORIZONTAL ;
  WIDTH 0.1 ;
  SPACINGTABLE
    PARALLELRUNLENGTH 0.0
    WIDTH 0.0 0.1 ;
END M1

LAYER V1
  TYPE CUT ;
END V1

VIA VIA12 DEFAULT
  LAYER M1 ;
    RECT -0.1 -0.1 0.1 0.1 ;
  LAYER V1 ;
    RECT -0.05 -0.05 0.05 0.05 ;
END VIA12

VIARULE VIAGEN12 GENERATE
  LAYER M1 ;
    ENCLOSURE 0.05 0.01 ;
END VIAGEN12

SITE core
  CLASS CORE ;
  SIZE 0.2 BY 1.6 ;
END core

MACRO INV # inverter
  CLASS CORE ;
  SIZE 0.6 BY 1.6 ;
  SITE core ;
  PIN A
    DIRECTION INPUT ;
    PORT
      LAYER M1 ;
        RECT 0 0 0.1 0.1 ;
    END
  END A
  PIN Y
    DIRECTION OUTPUT ;
    USE SIGNAL ;
  END Y
  OBS
    LAYER M1 ;
      RECT 0 0 0.6 1.6 ;
  END
END INV

END LIBRARY
"#;

    #[test]
    fn test_parse_tech_and_library() {
        let (tech, lib) = parse_lef(LEF, "cells").unwrap();
        assert_eq!(tech.dbu_per_micron, 2000);
        let m1 = tech.find_layer("M1").unwrap();
        assert_eq!(m1.kind, LayerKind::Routing);
        assert_eq!(m1.width, 200);
        assert_eq!(m1.direction, Some(LayerDirection::Horizontal));
        assert_eq!(tech.find_layer("V1").unwrap().kind, LayerKind::Cut);
        assert_eq!(tech.find_via("VIA12").unwrap().layers, vec!["M1", "V1"]);
        assert!(tech.has_via_rule("VIAGEN12"));

        let site = lib.sites.get("core").unwrap();
        assert_eq!((site.width, site.height), (400, 3200));
        assert_eq!(site.class.as_deref(), Some("CORE"));

        let inv = lib.masters.get("INV").unwrap();
        assert_eq!(inv.width, 1200);
        assert_eq!(inv.pins.len(), 2);
        assert_eq!(inv.find_pin("A").unwrap().io_type, Some(IoType::Input));
        assert_eq!(inv.find_pin("Y").unwrap().sig_type, Some(SigType::Signal));
    }

    #[test]
    fn test_missing_units_defaults() {
        let (tech, _) = parse_lef("LAYER M1\n TYPE ROUTING ;\n WIDTH 0.1 ;\nEND M1\n", "l").unwrap();
        assert_eq!(tech.dbu_per_micron, 1000);
        assert_eq!(tech.find_layer("M1").unwrap().width, 100);
    }

    #[test]
    fn test_unterminated_block_reports_line() {
        let err = parse_lef("MACRO BUF\n  CLASS CORE ;\n", "l").unwrap_err();
        let LefError::Syntax { line, msg } = err else {
            panic!("expected syntax error");
        };
        assert_eq!(line, 2);
        assert!(msg.contains("END BUF"), "{msg}");
    }

    #[test]
    fn test_bad_number() {
        let err = parse_lef("SITE s\n SIZE abc BY 1 ;\nEND s\n", "l").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
