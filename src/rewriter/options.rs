//! Raw rewriter options as authored.

use serde::{Deserialize, Serialize};

/// A named rewriter before compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriterOptions {
    /// Instructions in execution order, each `[scope, operation, args...]`.
    pub instructions: Vec<Vec<String>>,
}
