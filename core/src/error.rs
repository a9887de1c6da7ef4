use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        write!(f, "{}", level_str)
    }
}

pub trait KaleidoErrorExt {
    fn level(&self) -> Level;
    fn message(&self) -> String;
    fn issuer(&self) -> String;
}

impl fmt::Debug for dyn KaleidoErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KALEIDO | {} | {} | {}",
            self.level(),
            self.issuer(),
            self.message()
        )
    }
}

impl fmt::Display for dyn KaleidoErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The ways lowering a function can fail.
///
/// The first six are user errors in the lowered program. `DuplicateParameter`
/// guards prototypes that would otherwise alias parameters, and the last two
/// report an inconsistent builder state or a structurally invalid function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LowerErrorKind {
    UnknownVariable,
    UnknownOperator,
    UnknownFunction,
    ArityMismatch,
    Redefinition,
    ArityConflict,
    DuplicateParameter,
    InvalidInsertPoint,
    Verification,
}

impl LowerErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LowerErrorKind::UnknownVariable => "unknown-variable",
            LowerErrorKind::UnknownOperator => "unknown-operator",
            LowerErrorKind::UnknownFunction => "unknown-function",
            LowerErrorKind::ArityMismatch => "arity-mismatch",
            LowerErrorKind::Redefinition => "redefinition",
            LowerErrorKind::ArityConflict => "arity-conflict",
            LowerErrorKind::DuplicateParameter => "duplicate-parameter",
            LowerErrorKind::InvalidInsertPoint => "invalid-insert-point",
            LowerErrorKind::Verification => "verification",
        }
    }
}

impl fmt::Display for LowerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LowerError {
    level: Level,
    kind: LowerErrorKind,
    message: String,
}

impl LowerError {
    pub fn new(kind: LowerErrorKind, message: impl Into<String>) -> Self {
        let level = match kind {
            LowerErrorKind::InvalidInsertPoint | LowerErrorKind::Verification => Level::Critical,
            _ => Level::Error,
        };
        LowerError {
            level,
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> LowerErrorKind {
        self.kind
    }
}

impl fmt::Display for LowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.kind)
    }
}

impl std::error::Error for LowerError {}

impl KaleidoErrorExt for LowerError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        "kaleido.lower".to_string()
    }
}

pub type LowerResult<T> = Result<T, LowerError>;

/// Failure while interpreting lowered IR.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecError {
    message: String,
}

impl ExecError {
    pub fn new(message: impl Into<String>) -> Self {
        ExecError { message: message.into() }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExecError {}

impl KaleidoErrorExt for ExecError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        "kaleido.exec".to_string()
    }
}

/// Error produced by a session while handling one top-level item.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Lower(LowerError),
    Exec(ExecError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Lower(e) => write!(f, "{}", e),
            SessionError::Exec(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<LowerError> for SessionError {
    fn from(e: LowerError) -> Self {
        SessionError::Lower(e)
    }
}

impl From<ExecError> for SessionError {
    fn from(e: ExecError) -> Self {
        SessionError::Exec(e)
    }
}

impl KaleidoErrorExt for SessionError {
    fn level(&self) -> Level {
        match self {
            SessionError::Lower(e) => e.level(),
            SessionError::Exec(e) => e.level(),
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::Lower(e) => e.message(),
            SessionError::Exec(e) => e.message(),
        }
    }

    fn issuer(&self) -> String {
        match self {
            SessionError::Lower(e) => e.issuer(),
            SessionError::Exec(e) => e.issuer(),
        }
    }
}
