//! Token handoff type between the (external) lexer and the AST factory.

/// Lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    BoolLiteral,
    /// Number with a one-letter time-unit suffix (`10m`, `500a`, ...).
    DurationLiteral,
    /// Placeholder for an absent optional token.
    Nil,
}

/// One lexed token: its class and the source text it covers.
///
/// The factory copies the text it keeps; tokens never outlive a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// The absent token.
    pub const NIL: Token<'static> = Token {
        kind: TokenKind::Nil,
        text: "",
    };

    #[must_use]
    pub fn new(kind: TokenKind, text: &'a str) -> Self {
        Self { kind, text }
    }

    /// Shorthand for an identifier token.
    #[must_use]
    pub fn ident(text: &'a str) -> Self {
        Self::new(TokenKind::Identifier, text)
    }

    /// Byte length of the covered text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
