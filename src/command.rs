//! Line command parsing.
//!
//! One command per line; the first character selects it:
//!
//! - `u <address>`: mark a host up
//! - `d <address>`: mark a host down
//! - `p`: print the minimal covering prefixes
//! - `x`: leave the command loop

use crate::ip::codec::{parse_ipv4, AddressError};
use std::net::Ipv4Addr;

/// Longest accepted line, excluding the line terminator
pub const MAX_LINE_LEN: usize = 255;

/// A parsed protocol command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up(u32),
    Down(u32),
    Print,
    Exit,
}

/// Errors for lines that do not form a valid command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    #[error("Bad Input: {0}")]
    Unrecognized(String),

    #[error("Bad Input: line is longer than {max} bytes")]
    LineTooLong { max: usize },
}

impl Command {
    /// Parse one line, with or without its trailing newline.
    ///
    /// # Examples
    /// ```
    /// use subnet_rollup::command::Command;
    ///
    /// assert_eq!(Command::parse("u 10.0.0.1\n"), Ok(Command::Up(0x0a00_0001)));
    /// assert_eq!(Command::parse("p"), Ok(Command::Print));
    /// assert!(Command::parse("u 10.0.0.256").is_err());
    /// assert!(Command::parse("hello").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.len() > MAX_LINE_LEN {
            return Err(CommandError::LineTooLong { max: MAX_LINE_LEN });
        }

        match line.as_bytes().first() {
            Some(b'u') => Ok(Command::Up(parse_ipv4(line[1..].trim())?)),
            Some(b'd') => Ok(Command::Down(parse_ipv4(line[1..].trim())?)),
            Some(b'p') => Ok(Command::Print),
            Some(b'x') => Ok(Command::Exit),
            _ => Err(CommandError::Unrecognized(line.to_string())),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Up(host) => write!(f, "u {}", Ipv4Addr::from(*host)),
            Command::Down(host) => write!(f, "d {}", Ipv4Addr::from(*host)),
            Command::Print => write!(f, "p"),
            Command::Exit => write!(f, "x"),
        }
    }
}
