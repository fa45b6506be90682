//! Placeholder tokens inside prompt text.
//!
//! A placeholder is `{name}` where the name is 1 to 64 characters with no braces or line
//! breaks. Anything else, including unbalanced braces, is literal text. The storage layer never
//! looks inside prompts; this is only used when a prompt is filled in.

use nom::IResult;
use nom::Parser;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1, take_while_m_n};
use nom::combinator::map;
use nom::multi::many0;
use nom::sequence::delimited;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("missing value for placeholder '{0}'")]
    Missing(String),
}

pub fn parse(input: &str) -> Vec<Segment<'_>> {
    match many0(parse_segment).parse(input) {
        Ok((_, segments)) => segments,
        Err(_) => vec![Segment::Literal(input)],
    }
}

fn parse_segment(input: &str) -> IResult<&str, Segment<'_>> {
    alt((
        map(parse_placeholder, Segment::Placeholder),
        map(take_till1(|c: char| c == '{'), Segment::Literal),
        map(tag("{"), Segment::Literal),
    ))
    .parse(input)
}

fn parse_placeholder(input: &str) -> IResult<&str, &str> {
    delimited(tag("{"), name, tag("}")).parse(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    take_while_m_n(1, 64, |c: char| c != '{' && c != '}' && c != '\n').parse(input)
}

/// Distinct placeholder names in order of first appearance.
pub fn names(input: &str) -> Vec<&str> {
    let mut names = Vec::new();
    for segment in parse(input) {
        if let Segment::Placeholder(name) = segment {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

pub fn render(input: &str, values: &HashMap<String, String>) -> Result<String, PlaceholderError> {
    let mut result = String::with_capacity(input.len());
    for segment in parse(input) {
        match segment {
            Segment::Literal(text) => result.push_str(text),
            Segment::Placeholder(name) => match values.get(name) {
                Some(value) => result.push_str(value),
                None => return Err(PlaceholderError::Missing(name.to_string())),
            },
        }
    }
    Ok(result)
}
