//! Process-backed front-end.
//!
//! Runs an external compiler executable once per parse. The document bytes
//! are written to the child's stdin; every stdout line that parses as a
//! [`ReportLine`] is forwarded to the error sink. Anything else on stdout is
//! ignored, and the exit status is not interpreted.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde::Deserialize;
use thiserror::Error;

use crate::parser::{FrontEnd, ParseContext};
use crate::sink::ErrorSink;

/// Argument placeholder replaced with the document's file name.
const FILE_PLACEHOLDER: &str = "{file}";

/// Configuration for the external front-end command.
#[derive(Debug, Clone, Deserialize)]
pub struct FrontEndConfig {
    /// Executable name or path (e.g. "fut").
    pub command: String,
    /// Arguments; `{file}` is replaced with the document's file name.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("front-end command `{command}` not found in PATH")]
    NotFound {
        command: String,
        #[source]
        source: which::Error,
    },
}

/// One error reported by the external front-end, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub filename: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub message: String,
}

impl ReportLine {
    /// Parse a stdout line. Returns `None` for blank or non-report lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    pub fn forward(&self, sink: &mut dyn ErrorSink) {
        sink.report(
            &self.filename,
            self.start_line,
            self.start_column,
            self.end_line,
            self.end_column,
            &self.message,
        );
    }
}

/// The shared system of a [`CommandFrontEnd`]: the resolved compiler.
///
/// Built-in symbols live inside the external compiler; the session-side state
/// is the executable every parse runs and a count of parses attached so far.
#[derive(Debug, Clone)]
pub struct Toolchain {
    program: PathBuf,
    parses: u64,
}

impl Toolchain {
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Number of parses run against this toolchain.
    #[must_use]
    pub fn parses(&self) -> u64 {
        self.parses
    }
}

/// Front-end backed by an external compiler process.
#[derive(Debug, Clone)]
pub struct CommandFrontEnd {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandFrontEnd {
    /// Resolve the configured command on `PATH`.
    pub fn new(config: &FrontEndConfig) -> Result<Self, FrontEndError> {
        let program = which::which(&config.command).map_err(|source| FrontEndError::NotFound {
            command: config.command.clone(),
            source,
        })?;
        tracing::debug!(program = %program.display(), "Resolved front-end command");
        Ok(Self::from_program(program, config.args.clone()))
    }

    /// Use an already-resolved executable.
    #[must_use]
    pub fn from_program(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    fn run(&self, program: &Path, filename: &str, input: &[u8]) -> io::Result<Output> {
        let mut child = Command::new(program)
            .args(
                self.args
                    .iter()
                    .map(|arg| arg.replace(FILE_PLACEHOLDER, filename)),
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("no stdin from child"))?;

        // Feed stdin from a second thread so a chatty child cannot deadlock
        // against a full stdout pipe.
        std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let output = child.wait_with_output()?;
            match writer.join() {
                Ok(Ok(())) => {}
                // The child may legitimately exit without reading its input.
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(io::Error::other("stdin writer panicked")),
            }
            Ok(output)
        })
    }
}

impl FrontEnd for CommandFrontEnd {
    type System = Toolchain;
    type Program = ();

    fn new_system(&self) -> Toolchain {
        Toolchain {
            program: self.program.clone(),
            parses: 0,
        }
    }

    fn new_program(&self) {}

    fn parse(
        &self,
        context: &mut ParseContext<'_, Toolchain, ()>,
        sink: &mut dyn ErrorSink,
        filename: &str,
        input: &[u8],
    ) {
        let toolchain = context.system_mut();
        toolchain.parses += 1;

        let output = match self.run(&toolchain.program, filename, input) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(
                    program = %toolchain.program.display(),
                    file = filename,
                    "Front-end command failed to run: {e}"
                );
                return;
            }
        };

        if !output.status.success() {
            tracing::trace!(status = %output.status, file = filename, "Front-end exited");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut reported = 0usize;
        for line in stdout.lines() {
            match ReportLine::parse(line) {
                Some(report) => {
                    report.forward(sink);
                    reported += 1;
                }
                None => tracing::trace!(line, "Ignoring front-end output line"),
            }
        }
        tracing::debug!(file = filename, reported, "Front-end parse finished");
    }
}
