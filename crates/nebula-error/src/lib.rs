#![forbid(unsafe_code)]

//! Shared error taxonomy for the Nebula workflow execution subsystem.
//!
//! Every fallible operation across the workspace -- template resolution,
//! expression evaluation, node execution, graph scheduling -- returns
//! [`Error`]. The error carries a [`Kind`] so callers can make retry /
//! `onError` routing decisions without parsing messages, the same shape
//! `action::ActionError` uses upstream: a tagged enum with
//! `is_retryable()` / `is_fatal()` predicates.

use std::fmt;

/// The kind of failure, mirroring the error taxonomy from the execution
/// design: `validation`, `template`, `handler`, `transient`, `timeout`,
/// `cancelled`, `fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Bad config, missing required field.
    Validation,
    /// Malformed template expression; usually demoted to a literal by the
    /// resolver rather than surfaced, but the evaluator returns this when
    /// asked to fail hard.
    Template,
    /// Domain-specific failure returned by a node handler.
    Handler,
    /// Network / I/O failure eligible for retry.
    Transient,
    /// Deadline exceeded.
    Timeout,
    /// Execution was cancelled externally.
    Cancelled,
    /// Registry miss, cyclic dependency, unreachable invariant -- bypasses
    /// `onError` and always terminates the execution.
    Fatal,
}

impl Kind {
    /// Whether errors of this kind are eligible for the `retry` `onError`
    /// policy (§7 propagation policy). `Transient` is the canonical case;
    /// `Timeout` is also commonly retried by callers that set a
    /// `retryOn` pattern, so it is left to [`Error::is_retryable`] rather
    /// than baked in here.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Whether errors of this kind always terminate the execution,
    /// bypassing `onError` entirely.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Fatal)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Template => "template",
            Self::Handler => "handler",
            Self::Transient => "transient",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// A tagged error carrying the node and execution it originated from, so
/// the terminal execution status can report "last node's error message
/// and node id" (§7 point 5) without callers threading that context
/// through every `?`.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: Kind,
    message: String,
    node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl Error {
    /// Build an error of the given kind.
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            node_id: None,
            details: None,
        }
    }

    /// Shorthand constructors, one per [`Kind`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Kind::Validation, message)
    }

    /// Shorthand for [`Kind::Template`].
    pub fn template(message: impl Into<String>) -> Self {
        Self::new(Kind::Template, message)
    }

    /// Shorthand for [`Kind::Handler`].
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(Kind::Handler, message)
    }

    /// Shorthand for [`Kind::Transient`].
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(Kind::Transient, message)
    }

    /// Shorthand for [`Kind::Timeout`].
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(Kind::Timeout, message)
    }

    /// Shorthand for [`Kind::Cancelled`].
    pub fn cancelled() -> Self {
        Self::new(Kind::Cancelled, "execution cancelled")
    }

    /// Shorthand for [`Kind::Fatal`].
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Kind::Fatal, message)
    }

    /// Attach the node id this error originated from.
    #[must_use]
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Attach structured detail (e.g. the validation field that failed).
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The error's kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The node id this error is attributed to, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    /// The human-readable message, without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured details, if any were attached.
    #[must_use]
    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    /// `true` for kinds the executor's `retry` `onError` policy may act
    /// on. Fatal and cancelled errors are never retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, Kind::Transient | Kind::Timeout)
    }

    /// `true` for errors that bypass `onError` and always terminate the
    /// execution (§7 point 4).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("invalid json: {err}"))
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
