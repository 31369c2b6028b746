//! subset_ts_vm_parser
//!
//! Minimal parser for the gradual-typing surface language checked by
//! `subset_ts_vm`.
//!
//! This is intentionally not a general-purpose parser for any real-world
//! language: it covers exactly the constructs the compiler/VM need to be
//! exercised from source text (type aliases, object/tuple/union/
//! intersection/conditional/template-literal types, generic functions, and
//! `const`/call statements), and nothing else. Treat it as a contract
//! surface between source text and [`ast::SourceFile`] rather than as the
//! thing under test in `subset_ts_vm`'s own suite, which mostly builds ASTs
//! by hand via [`ast::testing`].
//!
//! # Example
//!
//! ```
//! use subset_ts_vm_parser::parse;
//!
//! let source = "type T = string | number;";
//! let file = parse(source).expect("parse failed");
//! assert_eq!(file.statements.len(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::SourceFile;
pub use error::{ParseError, ParseErrors, ParseResult};
pub use lexer::{Lexer, SpannedToken};
pub use parser::Parser;
pub use span::{SourceMap, Span};
pub use token::Token;

#[cfg(any(test, feature = "testing"))]
pub use ast::testing;

/// Parse `source` into a [`SourceFile`], failing on the first parse error.
///
/// # Example
///
/// ```
/// use subset_ts_vm_parser::parse;
///
/// let file = parse("const x: string = \"hi\";").unwrap();
/// assert_eq!(file.statements.len(), 1);
/// ```
pub fn parse(source: &str) -> ParseResult<SourceFile> {
    let (file, errors) = parser::parse(source);
    if errors.is_empty() {
        Ok(file)
    } else {
        Err(errors.into_iter().next().unwrap())
    }
}

/// Parse `source` with error recovery, returning a best-effort tree
/// alongside every error encountered.
pub fn parse_with_errors(source: &str) -> (SourceFile, ParseErrors) {
    parser::parse(source)
}

/// Tokenize `source`, stopping at the first lexer error.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, ParseError>> {
    lexer::tokenize(source)
}

/// Get version information.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_source() {
        let file = parse("").unwrap();
        assert!(file.statements.is_empty());
    }

    #[test]
    fn parse_type_alias() {
        let file = parse("type T = string | number;").unwrap();
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn parse_function_with_generics() {
        let file = parse("function identity<T>(x: T): T { return x; }").unwrap();
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn tokenize_basic() {
        let tokens = tokenize("type T = string;");
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| t.is_ok()));
    }

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
