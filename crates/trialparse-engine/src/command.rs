//! Subprocess extraction engine
//!
//! Runs an extractor executable once per study. The study is written to the
//! child's stdin as JSON; the child answers on stdout in the relation record
//! protocol. Dictionary locations are passed as `--variables <path>` and
//! `--units <path>` after any configured arguments.

use crate::dictionary::Dictionaries;
use crate::EngineError;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use tracing::debug;
use trialparse_domain::traits::{CriteriaExtractor, ExtractorInput};

/// Engine backed by an external executable
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    dictionaries: Arc<Dictionaries>,
}

impl CommandEngine {
    /// Create an engine running `program` with the given dictionaries
    pub fn new(program: impl Into<PathBuf>, dictionaries: Arc<Dictionaries>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dictionaries,
        }
    }

    /// Arguments placed before the dictionary arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Executable path
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--variables")
            .arg(self.dictionaries.variables.source())
            .arg("--units")
            .arg(self.dictionaries.units.source())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl CriteriaExtractor for CommandEngine {
    type Error = EngineError;

    fn extract(&self, input: &ExtractorInput) -> Result<String, Self::Error> {
        let payload = serde_json::to_vec(input)?;

        let mut child = self.command().spawn().map_err(|e| {
            EngineError::Spawn(format!("{}: {}", self.program.display(), e))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("stdin was not captured".to_string()))?;

        // Feed stdin from a separate thread so a chatty child cannot block on
        // a full stdout pipe while we are still writing.
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&payload));
            let output = child.wait_with_output();
            (output, writer.join())
        });
        let output = output?;

        if !output.status.success() {
            return Err(EngineError::Process {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        match written {
            Ok(Ok(())) => {}
            // child finished without reading all of its input
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(EngineError::Io(e)),
            Err(_) => return Err(EngineError::Other("stdin writer panicked".to_string())),
        }

        debug!(
            "Extractor {} answered {} bytes for {}",
            self.program.display(),
            output.stdout.len(),
            input.nct_id
        );

        String::from_utf8(output.stdout)
            .map_err(|e| EngineError::InvalidResponse(format!("Output is not UTF-8: {}", e)))
    }
}
