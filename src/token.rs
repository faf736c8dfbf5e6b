//! The token definition for the legacy filter clause language.

/// A token is a single unit of the language, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // Keywords
    And,     // "AND"
    Or,      // "OR"
    Not,     // "NOT"
    In,      // "IN"
    Is,      // "IS"
    Null,    // "NULL"
    Between, // "BETWEEN"
    Like,    // "LIKE"
    ILike,   // "ILIKE"
    True,    // "TRUE"
    False,   // "FALSE"

    // Literals
    Identifier(&'a str),
    /// Single-quoted string content without the surrounding quotes.
    /// `''` escape pairs are kept raw; the parser unescapes them.
    String(&'a str),
    /// Integer or decimal literal, kept as source text.
    Number(&'a str),

    // Punctuation
    LParen,    // (
    RParen,    // )
    Comma,     // ,
    Semicolon, // ;

    // Operators
    Eq,    // =
    NotEq, // != or <>
    Gt,    // >
    Lt,    // <
    Gte,   // >=
    Lte,   // <=

    // Special
    Illegal, // An illegal/unknown character
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
