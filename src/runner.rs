//! Pipeline glue: source bytes → tokens → AST → resolution → evaluation.
//!
//! Each stage reports everything it finds before the next one is skipped, so
//! a caller gets all lexical and syntax errors together, then all static
//! errors, and finally at most one runtime error.

use log::{debug, info};

use crate::ast::{Expr, Stmt};
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_all;
use crate::value::Value;

/// Errors from one run; every entry belongs to the same stage.
pub type Diagnostics = Vec<LoxError>;

/// Scan and parse a whole program.
pub fn parse_program(source: &[u8]) -> Result<Vec<Stmt>, Diagnostics> {
    let (tokens, mut errors) = scan_all(source);

    match Parser::new(tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(errors)
        }
    }
}

/// Scan and parse a single expression.
pub fn parse_expression(source: &[u8]) -> Result<Expr, Diagnostics> {
    let (tokens, errors) = scan_all(source);

    if !errors.is_empty() {
        return Err(errors);
    }

    Parser::new(tokens).parse_expression().map_err(|e| vec![e])
}

/// Run a program on `interpreter`.  Nothing is executed unless scanning,
/// parsing, and resolution all succeed.
pub fn run_source(interpreter: &mut Interpreter, source: &[u8]) -> Result<(), Diagnostics> {
    info!("Running {} byte(s) of source", source.len());

    let statements: Vec<Stmt> = parse_program(source)?;
    debug!("Parsed {} statement(s)", statements.len());

    Resolver::new(interpreter).resolve(&statements)?;

    interpreter.interpret(&statements).map_err(|e| vec![e])
}

/// Evaluate one expression against the interpreter's globals.
pub fn evaluate_source(interpreter: &mut Interpreter, source: &[u8]) -> Result<Value, Diagnostics> {
    let expr: Expr = parse_expression(source)?;

    Resolver::new(interpreter).resolve_expression(&expr)?;

    interpreter.evaluate(&expr).map_err(|e| vec![e])
}
