//! Pattern lexing.
//!
//! The raw token table is a [`logos`]-derived enum over the pattern bytes.
//! [`lex`] drives it and layers on the stateful rules a table cannot
//! express: escape resolution, the position-0 meaning of `^`, and the
//! restricted alphabet inside `{...}`.

use logos::Logos;

use crate::error::CompileError;

/// Tokens straight out of the derived table, before escape resolution.
#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum RawToken {
    #[token(b"*")]
    Star,
    #[token(b"+")]
    Plus,
    #[token(b"?")]
    Question,
    #[token(b"|")]
    Bar,
    #[token(b".")]
    Wildcard,
    #[token(b"^")]
    Circumflex,
    #[token(b"$")]
    Dollar,
    #[token(b"(")]
    OpenGroup,
    #[token(b")")]
    CloseGroup,
    #[token(b"[")]
    OpenClass,
    #[token(b"]")]
    CloseClass,
    #[token(b"{")]
    OpenBrace,
    #[token(b"}")]
    CloseBrace,
    #[token(b",")]
    Comma,
    #[token(b"-")]
    Dash,
    /// A backslash escape; the payload is the escaped byte.
    #[regex(br"\\[\x00-\xFF]", |lex| lex.slice()[1])]
    Escape(u8),
    /// Any other byte, matched literally.
    #[regex(br"[^.$()\[\]{}*+?|,\\^-]", |lex| lex.slice()[0])]
    Element(u8),
}

/// A resolved pattern token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Star,
    Plus,
    Question,
    Bar,
    Wildcard,
    /// `^` anywhere but offset 0; inside `[...]` it negates the class.
    Circumflex,
    Dollar,
    OpenGroup,
    CloseGroup,
    OpenClass,
    CloseClass,
    OpenBrace,
    CloseBrace,
    Comma,
    Dash,
    /// A literal byte.
    Element(u8),
    /// `\s`
    Space,
    /// `\d`
    Digit,
    /// `^` at offset 0.
    Start,
}

/// A token plus its byte offset in the pattern, for error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub at: usize,
}

/// Lexes a pattern into tokens.
///
/// Escapes are resolved here: `\t` becomes a tab element, `\s` and `\d`
/// become their class tokens, and any other escaped byte becomes a literal
/// element. `^` at offset 0 becomes [`Token::Start`]. Inside `{...}` only
/// ASCII digits, `,` and `}` are legal; anything else (or running out of
/// input) is a [`CompileError::BadToken`].
pub fn lex(pattern: &[u8]) -> Result<Vec<Spanned>, CompileError> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut lexer = RawToken::lexer(pattern);
    let mut open_brace: Option<usize> = None;
    while let Some(result) = lexer.next() {
        let at = lexer.span().start;
        let raw = result.map_err(|()| CompileError::BadToken(at))?;
        let token = match raw {
            RawToken::Escape(b't') => Token::Element(b'\t'),
            RawToken::Escape(b's') => Token::Space,
            RawToken::Escape(b'd') => Token::Digit,
            RawToken::Escape(b) => Token::Element(b),
            RawToken::Circumflex if at == 0 => Token::Start,
            RawToken::Circumflex => Token::Circumflex,
            RawToken::Star => Token::Star,
            RawToken::Plus => Token::Plus,
            RawToken::Question => Token::Question,
            RawToken::Bar => Token::Bar,
            RawToken::Wildcard => Token::Wildcard,
            RawToken::Dollar => Token::Dollar,
            RawToken::OpenGroup => Token::OpenGroup,
            RawToken::CloseGroup => Token::CloseGroup,
            RawToken::OpenClass => Token::OpenClass,
            RawToken::CloseClass => Token::CloseClass,
            RawToken::OpenBrace => Token::OpenBrace,
            RawToken::CloseBrace => Token::CloseBrace,
            RawToken::Comma => Token::Comma,
            RawToken::Dash => Token::Dash,
            RawToken::Element(b) => Token::Element(b),
        };
        if open_brace.is_some() {
            match token {
                Token::Element(b) if b.is_ascii_digit() => {}
                Token::Comma => {}
                Token::CloseBrace => open_brace = None,
                _ => return Err(CompileError::BadToken(at)),
            }
        } else if token == Token::OpenBrace {
            open_brace = Some(at);
        }
        out.push(Spanned { token, at });
    }
    if let Some(at) = open_brace {
        return Err(CompileError::BadToken(at));
    }
    Ok(out)
}
