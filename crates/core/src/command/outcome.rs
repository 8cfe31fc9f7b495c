use crate::errors::BoxError;
use std::error::Error;
use std::sync::Arc;

pub const SUCCESS_EXIT_CODE: i32 = 0;
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Result of running a command: exit code plus optional message and cause
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    exit_code: i32,
    message: Option<String>,
    cause: Option<Arc<dyn Error + Send + Sync>>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            exit_code: SUCCESS_EXIT_CODE,
            message: None,
            cause: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn failed(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: Some(message.into()),
            cause: None,
        }
    }

    pub fn failed_with_error(exit_code: i32, error: impl Into<BoxError>) -> Self {
        Self {
            exit_code,
            message: None,
            cause: Some(shared(error.into())),
        }
    }

    /// Attach a cause to an outcome
    pub fn with_cause(mut self, error: impl Into<BoxError>) -> Self {
        self.cause = Some(shared(error.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == SUCCESS_EXIT_CODE
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Terminate the process with this outcome's exit code
    pub fn exit(self) -> ! {
        std::process::exit(self.exit_code)
    }
}

fn shared(error: BoxError) -> Arc<dyn Error + Send + Sync> {
    Arc::from(error)
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.exit_code)?;
        if let Some(message) = &self.message {
            write!(f, " {}", message)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}
