//! Request rewriters.
//!
//! A rewriter is a named list of instructions authored as string arrays,
//! e.g. `["header", "set", "X-Origin", "edge"]`. The loader compiles every
//! declared rewriter once; origins and paths then refer to the compiled
//! form by name.

pub mod instructions;
pub mod options;

pub use instructions::{compile_all, Operation, RewriteInstruction, RewriteInstructions, RewriterError, Scope};
pub use options::RewriterOptions;
