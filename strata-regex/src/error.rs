use thiserror::Error;

/// An error produced while compiling a pattern.
///
/// The pattern is rejected wholesale; there is no partial compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A byte that is not legal at its position, e.g. a letter inside a
    /// `{...}` quantifier or a lone trailing `\`. Carries the byte offset
    /// into the pattern.
    #[error("unexpected token at offset {0}")]
    BadToken(usize),
    /// A `(` without its matching `)`, or a stray `)`.
    #[error("unterminated group")]
    UnterminatedGroup,
    /// A `[` without its matching `]`.
    #[error("unterminated character class")]
    UnterminatedClass,
    /// A malformed or misplaced quantifier, e.g. `{3,1}`, `a*+` or a
    /// leading `*`.
    #[error("malformed quantifier")]
    BadQuantifier,
}

/// An error produced while searching.
///
/// Searches are total unless a step limit is configured; this is the only
/// runtime failure and it is reported, never recovered from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The backtracker exceeded the configured step limit.
    #[error("backtracking step limit of {0} exceeded")]
    StepLimitExceeded(usize),
}
