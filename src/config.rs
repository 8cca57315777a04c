use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

pub const DEFAULT_HTML_PATH: &str = "public/index.html";
pub const DEFAULT_STYLESHEET_PATH: &str = "public/style.css";
pub const DEFAULT_SCRIPT_PATH: &str = "public/script.js";
pub const DEFAULT_INDENT: &str = "  ";

/// Options for a single compilation.
///
/// Every field has a default, so a partial JSON object (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Target path of the generated markup file, as named in the document headers.
    pub html_path: String,
    /// Target path of the generated stylesheet.
    pub stylesheet_path: String,
    /// Target path of the generated script.
    pub script_path: String,
    /// Indentation unit for one nesting level in markup and script.
    pub indent: String,
    /// Reparse the generated markup and script and report structural mismatches.
    pub verify_output: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            html_path: DEFAULT_HTML_PATH.to_string(),
            stylesheet_path: DEFAULT_STYLESHEET_PATH.to_string(),
            script_path: DEFAULT_SCRIPT_PATH.to_string(),
            indent: DEFAULT_INDENT.to_string(),
            verify_output: false,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(PlanError::InvalidOptions)
    }

    pub fn with_verification(mut self) -> Self {
        self.verify_output = true;
        self
    }

    /// `indent` repeated `depth` times.
    pub fn pad(&self, depth: usize) -> String {
        self.indent.repeat(depth)
    }
}

/// Last path segment, used for the relative links the markup must reference.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
