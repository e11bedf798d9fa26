// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Common utilities for parsing DEF statements
//!
//! A preprocessed statement is split into [Token]s, then walked with a
//! [Tokens] cursor that knows the statement's original line range.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1},
    character::complete::{char, multispace0},
    multi::many0,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::def::{DefOrient, DefPlacement, DefPlacementStatus, DefPoint, DefPropKind, DefProperty, DefRect};
use crate::error::SourceError;
use crate::utils::EnumStr;

/// Declared property kinds keyed by (owner object type, property name)
pub type PropKinds = HashMap<(String, String), DefPropKind>;

/// One lexical token of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub quoted: bool,
}

impl<'a> Token<'a> {
    fn plain(text: &'a str) -> Self {
        Self { text, quoted: false }
    }
}

fn quoted(input: &str) -> IResult<&str, Token<'_>> {
    delimited(char('"'), take_till(|c: char| c == '"'), char('"'))
        .map(|text| Token { text, quoted: true })
        .parse(input)
}

fn paren(input: &str) -> IResult<&str, Token<'_>> {
    alt((tag("("), tag(")"))).map(Token::plain).parse(input)
}

fn word(input: &str) -> IResult<&str, Token<'_>> {
    take_till1(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '"')
        .map(Token::plain)
        .parse(input)
}

/// Split a statement into words, quoted strings and parentheses
pub fn tokenize(stmt: &str) -> Result<Vec<Token<'_>>, String> {
    let (rest, tokens) = many0(preceded(multispace0, alt((quoted, paren, word))))
        .parse(stmt)
        .map_err(|e| format!("Cannot tokenize statement: {e}"))?;
    let rest = rest.trim();
    if !rest.is_empty() {
        return Err(format!("Unterminated quoted string near `{rest}`"));
    }
    Ok(tokens)
}

/// Cursor over the tokens of one statement
#[derive(Debug)]
pub struct Tokens<'a> {
    toks: Vec<Token<'a>>,
    pos: usize,
    lines: (usize, usize),
}

impl<'a> Tokens<'a> {
    pub fn new(toks: Vec<Token<'a>>, lines: (usize, usize)) -> Self {
        Self { toks, pos: 0, lines }
    }

    pub fn err(&self, msg: impl Into<String>) -> SourceError {
        SourceError::syntax(self.lines, msg)
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.toks.len()
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.peek_at(0)
    }

    pub fn peek_at(&self, ahead: usize) -> Option<&'a str> {
        self.toks.get(self.pos + ahead).map(|t| t.text)
    }

    pub fn next_token(&mut self) -> Option<Token<'a>> {
        let token = self.toks.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    pub fn next(&mut self) -> Option<&'a str> {
        self.next_token().map(|t| t.text)
    }

    /// Next token is the unquoted keyword `kw`, in any case
    pub fn at(&self, kw: &str) -> bool {
        self.toks
            .get(self.pos)
            .is_some_and(|t| !t.quoted && t.text.eq_ignore_ascii_case(kw))
    }

    pub fn eat(&mut self, kw: &str) -> bool {
        let hit = self.at(kw);
        if hit {
            self.pos += 1;
        }
        hit
    }

    pub fn expect(&mut self, kw: &str) -> Result<(), SourceError> {
        if self.eat(kw) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(found) => self.err(format!("Expected {kw}, found {found}")),
            None => self.err(format!("Expected {kw} at end of statement")),
        })
    }

    /// `+ kw` starts the next option
    pub fn at_option(&self, kw: &str) -> bool {
        self.at("+") && self.peek_at(1).is_some_and(|t| t.eq_ignore_ascii_case(kw))
    }

    pub fn word(&mut self, what: &str) -> Result<&'a str, SourceError> {
        self.next()
            .ok_or_else(|| self.err(format!("Missing {what}")))
    }

    /// Uppercased keyword, for matching option names
    pub fn keyword(&mut self, what: &str) -> Result<String, SourceError> {
        self.word(what).map(str::to_ascii_uppercase)
    }

    pub fn int(&mut self, what: &str) -> Result<i32, SourceError> {
        let text = self.word(what)?;
        parse_int(text).ok_or_else(|| self.err(format!("Invalid {what} `{text}`")))
    }

    pub fn float(&mut self, what: &str) -> Result<f64, SourceError> {
        let text = self.word(what)?;
        text.parse()
            .map_err(|_| self.err(format!("Invalid {what} `{text}`")))
    }

    pub fn count(&mut self, what: &str) -> Result<usize, SourceError> {
        let text = self.word(what)?;
        text.parse()
            .map_err(|_| self.err(format!("Invalid {what} `{text}`")))
    }

    pub fn enum_value<T: EnumStr>(&mut self, what: &str) -> Result<T, SourceError> {
        let text = self.word(what)?;
        T::parse(text).ok_or_else(|| self.err(format!("Unknown {what} `{text}`")))
    }

    /// `( x y )`; `*` repeats the matching coordinate of `prev`
    pub fn point_after(&mut self, prev: Option<DefPoint>) -> Result<DefPoint, SourceError> {
        self.expect("(")?;
        let x = self.coord("x coordinate", prev.map(|p| p.x))?;
        let y = self.coord("y coordinate", prev.map(|p| p.y))?;
        self.expect(")")?;
        Ok(DefPoint::new(x, y))
    }

    fn coord(&mut self, what: &str, prev: Option<i32>) -> Result<i32, SourceError> {
        if self.at("*") {
            self.pos += 1;
            return prev.ok_or_else(|| self.err(format!("`*` {what} without a previous point")));
        }
        self.int(what)
    }

    pub fn point(&mut self) -> Result<DefPoint, SourceError> {
        self.point_after(None)
    }

    /// Two corner points
    pub fn rect(&mut self) -> Result<DefRect, SourceError> {
        let a = self.point()?;
        let b = self.point_after(Some(a))?;
        Ok(DefRect::new(a.x, a.y, b.x, b.y))
    }

    /// Points for as long as a `(` follows
    pub fn points(&mut self) -> Result<Vec<DefPoint>, SourceError> {
        let mut points = Vec::new();
        while self.at("(") {
            let prev = points.last().copied();
            points.push(self.point_after(prev)?);
        }
        Ok(points)
    }

    /// Skip the rest of an unrecognized option up to the next `+`
    pub fn skip_option(&mut self) {
        while !self.is_done() && !self.at("+") {
            self.pos += 1;
        }
    }

    /// Remaining tokens joined by spaces
    pub fn rest(&mut self) -> String {
        let rest: Vec<&str> = self.toks[self.pos..].iter().map(|t| t.text).collect();
        self.pos = self.toks.len();
        rest.join(" ")
    }
}

/// Integer field; a value written with a fractional `.0` is accepted
pub fn parse_int(text: &str) -> Option<i32> {
    text.parse::<i32>().ok().or_else(|| {
        let v = text.parse::<f64>().ok()?;
        (v.fract() == 0.0 && v.abs() <= f64::from(i32::MAX)).then_some(v as i32)
    })
}

/// Placement after its status keyword: `pt orient` unless UNPLACED
pub fn placement(t: &mut Tokens<'_>, status: DefPlacementStatus) -> Result<DefPlacement, SourceError> {
    if status == DefPlacementStatus::Unplaced && !t.at("(") {
        return Ok(DefPlacement::unplaced());
    }
    let at = t.point()?;
    let orient = t.enum_value::<DefOrient>("orientation")?;
    Ok(DefPlacement { status, at, orient })
}

/// `name value` pairs of a `+ PROPERTY` option
pub fn properties(
    t: &mut Tokens<'_>,
    kinds: &PropKinds,
    owner: &str,
    out: &mut Vec<DefProperty>,
) -> Result<(), SourceError> {
    while !t.is_done() && !t.at("+") {
        let name = t.word("property name")?;
        let value = t
            .next_token()
            .ok_or_else(|| t.err(format!("Missing value for property {name}")))?;
        let number = value.text.parse::<f64>().ok();
        let kind = match kinds.get(&(owner.to_string(), name.to_string())) {
            Some(kind) => *kind,
            None if value.quoted => DefPropKind::Quoted,
            None if number.is_some() => DefPropKind::Real,
            None => DefPropKind::Str,
        };
        out.push(DefProperty {
            name: name.to_string(),
            kind,
            value: value.text.to_string(),
            number,
        });
    }
    Ok(())
}
