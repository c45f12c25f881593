//! Compilation of raw rewriter instructions.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::rewriter::options::RewriterOptions;

/// Errors raised while compiling a rewriter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriterError {
    #[error("rewriter [{rewriter}] instruction {index}: empty instruction")]
    Empty { rewriter: String, index: usize },

    #[error("rewriter [{rewriter}] instruction {index}: unknown scope [{scope}]")]
    UnknownScope {
        rewriter: String,
        index: usize,
        scope: String,
    },

    #[error("rewriter [{rewriter}] instruction {index}: unsupported operation [{operation}] for scope [{scope}]")]
    UnsupportedOperation {
        rewriter: String,
        index: usize,
        scope: Scope,
        operation: String,
    },

    #[error("rewriter [{rewriter}] instruction {index}: [{scope} {operation}] expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        rewriter: String,
        index: usize,
        scope: Scope,
        operation: Operation,
        expected: usize,
        actual: usize,
    },
}

/// The part of the request an instruction mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Method,
    Scheme,
    Host,
    Hostname,
    Port,
    Path,
    Param,
    Header,
}

impl Scope {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "method" => Scope::Method,
            "scheme" => Scope::Scheme,
            "host" => Scope::Host,
            "hostname" => Scope::Hostname,
            "port" => Scope::Port,
            "path" => Scope::Path,
            "param" | "params" => Scope::Param,
            "header" | "headers" => Scope::Header,
            _ => return None,
        })
    }

    /// Argument count for `operation` in this scope, if supported.
    fn arity(&self, operation: Operation) -> Option<usize> {
        use Operation::*;
        match (self, operation) {
            (Scope::Method | Scope::Scheme, Set) => Some(1),
            (Scope::Host | Scope::Hostname | Scope::Path, Set) => Some(1),
            (Scope::Host | Scope::Hostname | Scope::Path, Replace) => Some(2),
            (Scope::Port, Set) => Some(1),
            (Scope::Port, Replace) => Some(2),
            (Scope::Port, Delete) => Some(0),
            (Scope::Param | Scope::Header, Set | Append) => Some(2),
            (Scope::Param | Scope::Header, Replace) => Some(3),
            (Scope::Param | Scope::Header, Delete) => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Method => "method",
            Scope::Scheme => "scheme",
            Scope::Host => "host",
            Scope::Hostname => "hostname",
            Scope::Port => "port",
            Scope::Path => "path",
            Scope::Param => "param",
            Scope::Header => "header",
        };
        f.write_str(name)
    }
}

/// What an instruction does within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Set,
    Replace,
    Delete,
    Append,
}

impl Operation {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "set" => Operation::Set,
            "replace" => Operation::Replace,
            "delete" => Operation::Delete,
            "append" => Operation::Append,
            _ => return None,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Set => "set",
            Operation::Replace => "replace",
            Operation::Delete => "delete",
            Operation::Append => "append",
        };
        f.write_str(name)
    }
}

/// One compiled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteInstruction {
    pub scope: Scope,
    pub operation: Operation,
    pub args: Vec<String>,
}

/// A compiled rewriter, executed in order.
pub type RewriteInstructions = Vec<RewriteInstruction>;

/// Compile a single rewriter.
pub fn compile(name: &str, options: &RewriterOptions) -> Result<RewriteInstructions, RewriterError> {
    options
        .instructions
        .iter()
        .enumerate()
        .map(|(index, raw)| compile_instruction(name, index, raw))
        .collect()
}

/// Compile every declared rewriter, failing on the first malformed one.
pub fn compile_all(
    rewriters: &BTreeMap<String, RewriterOptions>,
) -> Result<BTreeMap<String, RewriteInstructions>, RewriterError> {
    rewriters
        .iter()
        .map(|(name, options)| Ok((name.clone(), compile(name, options)?)))
        .collect()
}

fn compile_instruction(
    rewriter: &str,
    index: usize,
    raw: &[String],
) -> Result<RewriteInstruction, RewriterError> {
    let (scope_name, rest) = raw.split_first().ok_or_else(|| RewriterError::Empty {
        rewriter: rewriter.to_string(),
        index,
    })?;

    let scope_name = scope_name.to_lowercase();
    let scope = Scope::parse(&scope_name).ok_or_else(|| RewriterError::UnknownScope {
        rewriter: rewriter.to_string(),
        index,
        scope: scope_name.clone(),
    })?;

    let unsupported = |operation: &str| RewriterError::UnsupportedOperation {
        rewriter: rewriter.to_string(),
        index,
        scope,
        operation: operation.to_string(),
    };

    let (op_name, args) = rest.split_first().ok_or_else(|| unsupported(""))?;
    let op_name = op_name.to_lowercase();
    let operation = Operation::parse(&op_name).ok_or_else(|| unsupported(&op_name))?;
    let expected = scope.arity(operation).ok_or_else(|| unsupported(&op_name))?;

    if args.len() != expected {
        return Err(RewriterError::ArgumentCount {
            rewriter: rewriter.to_string(),
            index,
            scope,
            operation,
            expected,
            actual: args.len(),
        });
    }

    Ok(RewriteInstruction {
        scope,
        operation,
        args: args.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(instructions: &[&[&str]]) -> RewriterOptions {
        RewriterOptions {
            instructions: instructions
                .iter()
                .map(|i| i.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_compile_valid_rewriter() {
        let compiled = compile(
            "rw",
            &options(&[
                &["header", "set", "X-Origin", "edge"],
                &["PATH", "Replace", "/v1", "/v2"],
                &["port", "delete"],
            ]),
        )
        .unwrap();

        assert_eq!(compiled.len(), 3);
        assert_eq!(compiled[0].scope, Scope::Header);
        assert_eq!(compiled[0].args, vec!["X-Origin", "edge"]);
        assert_eq!(compiled[1].operation, Operation::Replace);
        assert!(compiled[2].args.is_empty());
    }

    #[test]
    fn test_compile_errors_name_rewriter_and_index() {
        let err = compile("rw", &options(&[&["method", "set", "GET"], &["cookie", "set"]])).unwrap_err();
        assert_eq!(
            err,
            RewriterError::UnknownScope {
                rewriter: "rw".into(),
                index: 1,
                scope: "cookie".into()
            }
        );

        let err = compile("rw", &options(&[&["method", "delete"]])).unwrap_err();
        assert!(matches!(err, RewriterError::UnsupportedOperation { .. }));

        let err = compile("rw", &options(&[&["header", "set", "X-Only-Name"]])).unwrap_err();
        assert!(err.to_string().contains("expects 2 argument(s), got 1"));

        let err = compile("rw", &options(&[&[]])).unwrap_err();
        assert!(matches!(err, RewriterError::Empty { index: 0, .. }));
    }

    #[test]
    fn test_compile_all_stops_on_first_failure() {
        let mut rewriters = BTreeMap::new();
        rewriters.insert("good".to_string(), options(&[&["scheme", "set", "https"]]));
        assert_eq!(compile_all(&rewriters).unwrap().len(), 1);

        rewriters.insert("bad".to_string(), options(&[&["scheme", "append", "x", "y"]]));
        assert!(compile_all(&rewriters).is_err());
    }
}
