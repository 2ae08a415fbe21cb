//! Token-validating AST factory.
//!
//! Grammar actions hand lexed tokens to an [`AstBuilder`], which validates
//! identifier bounds and literal shapes, builds nodes from `tempoql-nodes`,
//! and carries a fail-fast build context: the first failure sticks, later
//! calls return `None`, and the whole statement is judged once at
//! [`AstBuilder::finish`].

pub mod builder;
pub mod token;

pub use builder::AstBuilder;
pub use token::{Token, TokenKind};
