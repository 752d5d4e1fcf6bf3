//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Every stage (scanner, parser, resolver, runtime) reports its failures as one
//! of the variants defined here, so the whole crate shares a single
//! `Result<T>` alias and the binary can map any failure to an exit code.
//!
//! The module **does not** print diagnostics itself.
//!
//! The `return` statement is *not* an error; see `interpreter::Flow`.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is `" at end"` or `" at 'x'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis failure reported by the resolver.
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Resolve {
        message: String,
        line: usize,
        lexeme: String,
    },

    /// Runtime evaluation error, carrying the line of the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// A host‑provided native function failed; `line` is that of the call.
    #[error("Native function '{name}' failed: {message}\n[line {line}]")]
    Native {
        name: String,
        message: String,
        line: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, located at `token`.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();
        let location = if token.is_eof() {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            lexeme: token.lexeme.clone(),
        }
    }

    /// Helper constructor for **runtime** failures raised at `token`.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Helper constructor for a failed **native** call made at `paren`.
    pub fn native<S: Into<String>>(paren: &Token, name: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Native error: line={}, fn={}, msg={}",
            paren.line, name, message
        );

        LoxError::Native {
            name: name.to_string(),
            message,
            line: paren.line,
        }
    }

    /// Process exit code conventionally associated with this error
    /// (sysexits: 65 = data error, 70 = software error, 74 = I/O error).
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => 65,
            LoxError::Runtime { .. } | LoxError::Native { .. } => 70,
            LoxError::Io(_) => 74,
        }
    }

    /// `true` for errors detected before evaluation starts.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
