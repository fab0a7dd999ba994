use serde::Serialize;

use crate::kind::ErrorKind;

/// One entry of a native HDF5 error stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Frame {
    /// Function that pushed the entry.
    pub func: String,
    /// Library source file of `func`.
    pub file: String,
    pub line: u32,
    /// Major error message.
    pub major: String,
    /// Minor error message.
    pub minor: String,
    /// Free-form description supplied where the error was pushed.
    pub desc: String,
}

impl Frame {
    /// Formats the frame the way the library prints its own stacks.
    pub fn detail(&self) -> String {
        format!(
            "{}:{} in {}(): {}\n    major: {}\n    minor: {}",
            self.file, self.line, self.func, self.desc, self.major, self.minor
        )
    }
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(msg) => format!(": {msg}"),
        None => String::new(),
    }
}

/// An error reported by the native HDF5 library.
///
/// The kind is fixed at construction. The message is kept exactly as given, and an absent
/// message is distinct from an empty one.
///
/// ```
/// use h5err::{ErrorKind, LibraryError};
///
/// let err = LibraryError::with_message(ErrorKind::DataFilters, "deflate filter not available");
/// assert_eq!(err.kind(), ErrorKind::DataFilters);
/// assert_eq!(err.message(), Some("deflate filter not available"));
/// assert_eq!(err.to_string(), "Data filters layer: deflate filter not available");
/// ```
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[error("{kind}{}", message_suffix(.message))]
pub struct LibraryError {
    kind: ErrorKind,
    message: Option<String>,
    minor: Option<String>,
    stack: Vec<Frame>,
}

impl LibraryError {
    /// Error of `kind` without any further context.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            minor: None,
            stack: Vec::default(),
        }
    }

    /// Error of `kind` carrying the diagnostic `message` verbatim.
    pub fn with_message<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(kind)
        }
    }

    /// Attach the minor error description.
    #[must_use]
    pub fn with_minor<S: Into<String>>(mut self, minor: S) -> Self {
        self.minor = Some(minor.into());
        self
    }

    /// Attach the native error stack, outermost frame first.
    #[must_use]
    pub fn with_stack(mut self, stack: Vec<Frame>) -> Self {
        self.stack = stack;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Minor error description of the frame this error was classified from.
    pub fn minor(&self) -> Option<&str> {
        self.minor.as_deref()
    }

    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}
