//! Command loop.
//!
//! A [`Session`] owns the address tree and executes protocol lines against
//! it. Prefix listings go to the output writer; rejected commands are
//! reported on the error writer and the loop carries on. Only stream
//! failures and invariant violations end a run early.

use crate::command::{Command, CommandError, MAX_LINE_LEN};
use crate::ip::codec::Cidr;
use crate::tree::{AddressTree, InvariantViolation, TreeError};
use clap::ValueEnum;
use log::{debug, info, log, Level};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Read, Write};

/// Rejected commands already go to the error writer; the log copy stays
/// below the default filter
pub const REJECTION_LOG_LEVEL: Level = Level::Debug;

/// How `p` renders the prefix list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `a.b.c.d/width` per line
    #[default]
    Text,
    /// A single JSON array of prefix strings
    Json,
}

/// Errors raised while executing a command
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Tree invariant violated after '{command}': {source}")]
    Invariant {
        command: Command,
        #[source]
        source: InvariantViolation,
    },

    #[error("Failed to encode prefix list: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Whether the loop should report the error and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::Command(_) | SessionError::Tree(_))
    }
}

/// Whether the loop should keep reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Counters for one [`Session::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines executed successfully, `x` included
    pub executed: usize,
    /// Lines reported as invalid
    pub rejected: usize,
}

/// An address tree plus the settings of the command loop driving it
#[derive(Debug)]
pub struct Session {
    tree: AddressTree,
    format: OutputFormat,
    verify: bool,
}

impl Session {
    pub fn new(tree: AddressTree, format: OutputFormat) -> Self {
        Self {
            tree,
            format,
            verify: false,
        }
    }

    /// Check the tree invariants after every up/down command
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn tree(&self) -> &AddressTree {
        &self.tree
    }

    /// Current minimal cover of the up hosts
    pub fn prefixes(&self) -> Vec<Cidr> {
        self.tree.aggregate().collect()
    }

    /// Parse and execute a single line.
    ///
    /// On error the tree is left exactly as it was.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, SessionError> {
        let command = Command::parse(line)?;
        self.apply(command, out)
    }

    /// Execute an already parsed command
    pub fn apply<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow, SessionError> {
        debug!("Executing '{}'", command);

        match command {
            Command::Up(host) => self.tree.mark_up(host)?,
            Command::Down(host) => self.tree.mark_down(host)?,
            Command::Print => {
                self.write_prefixes(out)?;
                return Ok(Flow::Continue);
            }
            Command::Exit => return Ok(Flow::Exit),
        }

        if self.verify {
            self.tree
                .check_invariants()
                .map_err(|source| SessionError::Invariant { command, source })?;
        }

        Ok(Flow::Continue)
    }

    fn write_prefixes<W: Write>(&self, out: &mut W) -> Result<(), SessionError> {
        match self.format {
            OutputFormat::Text => {
                for block in self.tree.aggregate() {
                    writeln!(out, "{}", block)?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &self.prefixes())?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    /// Read and execute lines until `x` or end of input.
    ///
    /// Bytes that are not valid UTF-8 are replaced before parsing, so they
    /// end up reported as bad input rather than aborting the loop.
    pub fn run<R, W, E>(
        &mut self,
        mut input: R,
        out: &mut W,
        err: &mut E,
    ) -> Result<RunSummary, SessionError>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        let mut summary = RunSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let result = match read_line_bounded(&mut input, &mut buf)? {
                LineRead::Eof => {
                    debug!("End of input");
                    break;
                }
                LineRead::Line => self.execute(&String::from_utf8_lossy(&buf), out),
                LineRead::Overlong => Err(CommandError::LineTooLong { max: MAX_LINE_LEN }.into()),
            };

            match result {
                Ok(flow) => {
                    summary.executed += 1;
                    if flow == Flow::Exit {
                        break;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    log!(REJECTION_LOG_LEVEL, "Rejected command: {}", e);
                    writeln!(err, "{}", e)?;
                    summary.rejected += 1;
                }
                Err(e) => return Err(e),
            }
            out.flush()?;
        }

        out.flush()?;
        info!(
            "Command loop finished: {} executed, {} rejected, {} hosts up",
            summary.executed,
            summary.rejected,
            self.tree.up_count()
        );
        Ok(summary)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    Line,
    /// Longer than any accepted command; already consumed up to its newline
    Overlong,
}

/// Read one line into `buf`, holding at most `MAX_LINE_LEN` bytes plus a
/// CRLF terminator. The tail of a longer line is skipped without buffering.
fn read_line_bounded<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<LineRead> {
    let limit = MAX_LINE_LEN as u64 + 2;
    let read = input.by_ref().take(limit).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.ends_with(b"\n") || (read as u64) < limit {
        return Ok(LineRead::Line);
    }

    loop {
        let (used, done) = match input.fill_buf() {
            Ok(chunk) => match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (chunk.len(), chunk.is_empty()),
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        input.consume(used);
        if done {
            return Ok(LineRead::Overlong);
        }
    }
}
