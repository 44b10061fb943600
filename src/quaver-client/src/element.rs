//! Classification of single response lines.

use crate::error::{AckCode, AckError, MpdError, MpdResult};
use serde::{Deserialize, Serialize};

/// One `name: value` pair from a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub value: String,
}

impl Element {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// What a single response line means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Pair(Element),
    /// `list_OK`: one command inside an acknowledged list has finished.
    ListOk,
    /// `OK`: the whole response has finished.
    Ok,
    Ack(AckError),
}

pub fn classify(line: &str) -> MpdResult<Line> {
    if line == "OK" {
        return Ok(Line::Ok);
    }
    if line == "list_OK" {
        return Ok(Line::ListOk);
    }
    if line == "ACK" || line.starts_with("ACK ") {
        return Ok(Line::Ack(parse_ack(&line[3..])));
    }

    let (name, value) = line
        .split_once(": ")
        .ok_or_else(|| MpdError::Decode(format!("error parsing: {line}")))?;
    Ok(Line::Pair(Element::new(name, value)))
}

/// Parse what follows `ACK`: ` [code@pos] {command} message`. Missing or
/// malformed pieces fall back to unknown values instead of failing.
fn parse_ack(rest: &str) -> AckError {
    let rest = rest.trim_start();
    let mut code = AckError::UNKNOWN_CODE;
    let mut position = AckError::UNKNOWN_POSITION;

    let after_bracket = match rest.strip_prefix('[').and_then(|r| r.split_once(']')) {
        Some((inner, tail)) => {
            if let Some((c, p)) = inner.split_once('@') {
                code = c.trim().parse().unwrap_or(AckError::UNKNOWN_CODE);
                position = p.trim().parse().unwrap_or(AckError::UNKNOWN_POSITION);
            }
            tail.trim_start()
        }
        None => rest,
    };

    let (command, message) = match after_bracket
        .strip_prefix('{')
        .and_then(|r| r.split_once('}'))
    {
        Some((cmd, msg)) => (Some(cmd.to_string()), msg.trim_start()),
        None => (None, after_bracket),
    };

    AckError {
        code: AckCode::from_code(code),
        position,
        command: command.filter(|c| !c.is_empty()),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_splits_on_first_separator() {
        let line = classify("Title: a: b").unwrap();
        assert_eq!(line, Line::Pair(Element::new("Title", "a: b")));
    }

    #[test]
    fn empty_value_is_allowed() {
        assert_eq!(
            classify("Genre: ").unwrap(),
            Line::Pair(Element::new("Genre", ""))
        );
    }

    #[test]
    fn terminal_markers() {
        assert_eq!(classify("OK").unwrap(), Line::Ok);
        assert_eq!(classify("list_OK").unwrap(), Line::ListOk);
    }

    #[test]
    fn line_without_separator_is_decode_error() {
        assert!(matches!(classify("garbage"), Err(MpdError::Decode(_))));
        assert!(matches!(classify("OKAY"), Err(MpdError::Decode(_))));
    }

    #[test]
    fn ack_carries_code_position_and_message() {
        let Line::Ack(ack) = classify("ACK [5@2] {play} song doesn't exist").unwrap() else {
            panic!("expected ACK");
        };
        assert_eq!(ack.code.code(), 5);
        assert_eq!(ack.code, AckCode::UnknownCommand);
        assert_eq!(ack.position, 2);
        assert_eq!(ack.command.as_deref(), Some("play"));
        assert!(ack.message.contains("song doesn't exist"));
    }

    #[test]
    fn ack_without_bracket_uses_unknown_values() {
        let Line::Ack(ack) = classify("ACK something broke").unwrap() else {
            panic!("expected ACK");
        };
        assert_eq!(ack.code, AckCode::Other(AckError::UNKNOWN_CODE));
        assert_eq!(ack.position, AckError::UNKNOWN_POSITION);
        assert_eq!(ack.command, None);
        assert_eq!(ack.message, "something broke");
    }

    #[test]
    fn ack_with_garbled_numbers_keeps_message() {
        let Line::Ack(ack) = classify("ACK [x@y] {} nope").unwrap() else {
            panic!("expected ACK");
        };
        assert_eq!(ack.code.code(), AckError::UNKNOWN_CODE);
        assert_eq!(ack.position, AckError::UNKNOWN_POSITION);
        assert_eq!(ack.command, None);
        assert_eq!(ack.message, "nope");
    }
}
