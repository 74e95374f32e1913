//! Domain error types.
//!
//! `LexError` and `ParseError` carry a byte offset into the source text.
//! `CompileError` is the single error surfaced by the condition-language
//! core; `TradesigError` wraps it for the application layer.

/// An invalid character or malformed literal found while tokenizing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("lex error at position {position}: {message}")]
pub struct LexError {
    pub message: String,
    pub position: usize,
    pub found: char,
}

/// A grammar violation with the set of tokens that would have been accepted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub expected: Vec<String>,
    pub found: String,
}

impl ParseError {
    pub fn new(position: usize, expected: &[&str], found: impl Into<String>) -> Self {
        let found = found.into();
        let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        let message = match expected.as_slice() {
            [] => format!("unexpected {}", found),
            [one] => format!("expected {}, found {}", one, found),
            many => format!("expected one of {}, found {}", many.join(", "), found),
        };
        Self {
            message,
            position,
            expected,
            found,
        }
    }

    /// A parse error whose message does not follow the expected/found form.
    pub fn custom(position: usize, message: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
            expected: Vec::new(),
            found: found.into(),
        }
    }

    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        render_caret(input, self.position, &self.to_string())
    }
}

/// Everything that can go wrong between DSL text and signal sequences.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown indicator '{name}' at position {position}")]
    UnknownIndicator { name: String, position: usize },

    #[error("unknown field '{name}' at position {position}")]
    UnknownField { name: String, position: usize },

    #[error("{name} takes {expected} argument(s), found {found} at position {position}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
        position: usize,
    },

    #[error("invalid argument to {name} at position {position}: {reason}")]
    InvalidArgument {
        name: String,
        position: usize,
        reason: String,
    },
}

impl CompileError {
    /// Byte offset into the DSL text where the problem was detected.
    pub fn position(&self) -> usize {
        match self {
            CompileError::Lex(e) => e.position,
            CompileError::Parse(e) => e.position,
            CompileError::UnknownIndicator { position, .. }
            | CompileError::UnknownField { position, .. }
            | CompileError::Arity { position, .. }
            | CompileError::InvalidArgument { position, .. } => *position,
        }
    }

    /// Format the error with a caret under the offending position of `input`.
    pub fn display_with_context(&self, input: &str) -> String {
        render_caret(input, self.position(), &self.to_string())
    }
}

/// Renders only the source line containing `position`, so multi-line
/// strategies still get a caret under the right column.
fn render_caret(input: &str, position: usize, err: &str) -> String {
    let position = position.min(input.len());
    let line_start = input[..position].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = input[position..]
        .find('\n')
        .map(|i| position + i)
        .unwrap_or(input.len());
    let line = &input[line_start..line_end];
    let column = input[line_start..position].chars().count();
    let caret = " ".repeat(column) + "^";
    format!("{line}\n{caret}\n{err}")
}

/// Top-level error type for tradesig.
#[derive(Debug, thiserror::Error)]
pub enum TradesigError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesigError {
    pub fn exit_status(&self) -> u8 {
        match self {
            TradesigError::Io(_) | TradesigError::Report { .. } => 1,
            TradesigError::ConfigParse { .. }
            | TradesigError::ConfigMissing { .. }
            | TradesigError::ConfigInvalid { .. } => 2,
            TradesigError::Data { .. } => 3,
            TradesigError::Compile(_) => 4,
        }
    }
}

impl From<&TradesigError> for std::process::ExitCode {
    fn from(err: &TradesigError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
