// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Header prescan
//!
//! A single line-oriented pass that picks up VERSION, DIVIDERCHAR,
//! BUSBITCHARS and DESIGN before the block is created. Scanning stops at
//! the DESIGN statement.

use nom::bytes::complete::{take_till1, take_while};
use nom::sequence::preceded;
use nom::{IResult, Parser};

use crate::error::HeaderError;

/// Header values needed to create a block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefHeader {
    pub version: Option<String>,
    pub design: String,
    pub hier_delimiter: Option<char>,
    pub bus_delimiters: Option<(char, char)>,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn is_blank_or_quote(c: char) -> bool {
    is_blank(c) || c == '"'
}

/// Next whitespace separated word
fn word(input: &str) -> IResult<&str, &str> {
    preceded(take_while(is_blank), take_till1(is_blank)).parse(input)
}

/// Next word with surrounding double quotes dropped
fn quoted_word(input: &str) -> IResult<&str, &str> {
    preceded(take_while(is_blank_or_quote), take_till1(is_blank_or_quote)).parse(input)
}

fn keyword_is(token: &str, keyword: &str) -> bool {
    token == keyword || token == keyword.to_ascii_lowercase()
}

impl DefHeader {
    pub fn scan(text: &str) -> Result<DefHeader, HeaderError> {
        let mut hdr = DefHeader::default();

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            let (rest, token) = match word(line) {
                Ok(r) => r,
                Err(_) => continue,
            };

            if keyword_is(token, "VERSION") {
                let (_, version) = word(rest).map_err(|_| HeaderError::Version(lineno))?;
                hdr.version = Some(version.to_string());
            } else if keyword_is(token, "DESIGN") {
                let (_, design) = word(rest).map_err(|_| HeaderError::Design(lineno))?;
                hdr.design = design.to_string();
                return Ok(hdr);
            } else if keyword_is(token, "DIVIDERCHAR") {
                let (_, divider) =
                    quoted_word(rest).map_err(|_| HeaderError::DividerChar(lineno))?;
                hdr.hier_delimiter = divider.chars().next();
            } else if keyword_is(token, "BUSBITCHARS") {
                let (_, bus) =
                    quoted_word(rest).map_err(|_| HeaderError::BusBitChars(lineno))?;
                let mut chars = bus.chars();
                match (chars.next(), chars.next()) {
                    (Some(l), Some(r)) => hdr.bus_delimiters = Some((l, r)),
                    _ => return Err(HeaderError::BusBitChars(lineno)),
                }
            } else if keyword_is(token, "COMPONENTS") {
                return Err(HeaderError::MissingDesign);
            }
        }

        Err(HeaderError::MissingDesign)
    }

    pub fn hier_delimiter_or_default(&self) -> char {
        self.hier_delimiter.unwrap_or('/')
    }

    pub fn bus_delimiters_or_default(&self) -> (char, char) {
        self.bus_delimiters.unwrap_or(('[', ']'))
    }
}
