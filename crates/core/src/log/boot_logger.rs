use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Diagnostic sink used while booting and running commands.
///
/// Trace lines carry composition diagnostics and are only emitted when
/// tracing is enabled; stdout and stderr lines are user facing.
pub trait BootLogger: Send + Sync {
    fn is_trace(&self) -> bool;

    fn trace(&self, line: &str);

    fn stdout(&self, line: &str);

    fn stderr(&self, line: &str);

    /// Write a line followed by the error and its chain of causes
    fn stderr_with(&self, line: &str, error: &(dyn Error + 'static));
}

/// Writes to the process console and mirrors every line as a `tracing` event
#[derive(Debug, Clone, Default)]
pub struct DefaultBootLogger {
    trace: bool,
}

impl DefaultBootLogger {
    pub fn new(trace: bool) -> Self {
        Self { trace }
    }
}

impl BootLogger for DefaultBootLogger {
    fn is_trace(&self) -> bool {
        self.trace
    }

    fn trace(&self, line: &str) {
        tracing::debug!(target: "strata::boot", "{}", line);
        if self.trace {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }

    fn stdout(&self, line: &str) {
        tracing::trace!(target: "strata::boot", "{}", line);
        let _ = writeln!(std::io::stdout().lock(), "{}", line);
    }

    fn stderr(&self, line: &str) {
        tracing::error!(target: "strata::boot", "{}", line);
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn stderr_with(&self, line: &str, error: &(dyn Error + 'static)) {
        tracing::error!(target: "strata::boot", error = %error, "{}", line);
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", line);
        for cause in error_chain(error) {
            let _ = writeln!(err, "Caused by: {}", cause);
        }
    }
}

/// Stream a captured line was written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStream {
    Trace,
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootLine {
    pub stream: BootStream,
    pub text: String,
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryBootLogger {
    trace: bool,
    lines: Arc<Mutex<Vec<BootLine>>>,
}

impl MemoryBootLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture trace lines as well
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    pub fn lines(&self) -> Vec<BootLine> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn trace_lines(&self) -> Vec<String> {
        self.stream(BootStream::Trace)
    }

    pub fn stdout_lines(&self) -> Vec<String> {
        self.stream(BootStream::Stdout)
    }

    pub fn stderr_lines(&self) -> Vec<String> {
        self.stream(BootStream::Stderr)
    }

    fn stream(&self, stream: BootStream) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.stream == stream)
            .map(|line| line.text)
            .collect()
    }

    fn push(&self, stream: BootStream, text: impl Into<String>) {
        let line = BootLine {
            stream,
            text: text.into(),
        };
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

impl BootLogger for MemoryBootLogger {
    fn is_trace(&self) -> bool {
        self.trace
    }

    fn trace(&self, line: &str) {
        if self.trace {
            self.push(BootStream::Trace, line);
        }
    }

    fn stdout(&self, line: &str) {
        self.push(BootStream::Stdout, line);
    }

    fn stderr(&self, line: &str) {
        self.push(BootStream::Stderr, line);
    }

    fn stderr_with(&self, line: &str, error: &(dyn Error + 'static)) {
        self.push(BootStream::Stderr, line);
        for cause in error_chain(error) {
            self.push(BootStream::Stderr, format!("Caused by: {}", cause));
        }
    }
}

fn error_chain<'a>(
    error: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |e| (*e).source())
}
