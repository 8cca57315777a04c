use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const DIAG_NO_ROOT: &str = "PLAN001";
pub const DIAG_DANGLING_EDGE: &str = "PLAN002";
pub const DIAG_UNKNOWN_NODE_TYPE: &str = "PLAN003";
pub const DIAG_INCOMPLETE_DECLARATION: &str = "PLAN004";
pub const DIAG_UNBOUND_EVENT: &str = "PLAN005";
pub const DIAG_EMPTY_ACTION_CHAIN: &str = "PLAN006";
pub const DIAG_CYCLE: &str = "PLAN007";
pub const DIAG_DUPLICATE_PARENT: &str = "PLAN008";
pub const DIAG_UNREACHABLE_AFTER_DELAY: &str = "PLAN009";
pub const DIAG_DUPLICATE_NODE_ID: &str = "PLAN010";
pub const DIAG_NOT_AN_ACTION: &str = "PLAN011";
pub const DIAG_EXTRA_BINDING: &str = "PLAN012";
pub const DIAG_MALFORMED_OUTPUT: &str = "PLAN013";

fn get_policy(code: &str) -> &'static str {
    match code {
        DIAG_NO_ROOT => "Compilation needs at least one HTML node without a parent connection.",
        DIAG_DANGLING_EDGE => "Edges pointing at unknown nodes are ignored.",
        DIAG_UNKNOWN_NODE_TYPE => "Nodes with an unknown type contribute nothing.",
        DIAG_INCOMPLETE_DECLARATION => {
            "Style declarations need both a property and a value."
        }
        DIAG_UNBOUND_EVENT => "Element events need a bound element with an id.",
        DIAG_EMPTY_ACTION_CHAIN => "Events without actions emit no listener.",
        DIAG_CYCLE => "Cyclic branches are cut at the first repeated node.",
        DIAG_DUPLICATE_PARENT => "A node is rendered under the first parent that reaches it.",
        DIAG_UNREACHABLE_AFTER_DELAY => {
            "Only the first successor of a delay is compiled, inside the delayed block."
        }
        DIAG_DUPLICATE_NODE_ID => "The first node with a given id wins.",
        DIAG_NOT_AN_ACTION => "Non-action nodes inside an action chain emit nothing.",
        DIAG_EXTRA_BINDING => "An event binds to the first connected element only.",
        DIAG_MALFORMED_OUTPUT => "Generated sections should reparse to the emitted structure.",
        _ => "Unknown diagnostic.",
    }
}

/// One skipped or degraded item, reported next to the compiled output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub policy: String,
    pub node_id: Option<String>,
}

impl Diagnostic {
    pub fn new(code: &str, message: impl Into<String>, node_id: Option<&str>) -> Self {
        Diagnostic {
            code: code.to_string(),
            message: message.into(),
            policy: get_policy(code).to_string(),
            node_id: node_id.map(str::to_string),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{}] node '{}': {}", self.code, id, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Collects diagnostics in emission order. Every entry is also logged at `debug`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, code: &str, message: impl Into<String>, node_id: Option<&str>) {
        let diagnostic = Diagnostic::new(code, message, node_id);
        log::debug!("[PlanCompiler] {}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in other {
            log::debug!("[PlanCompiler] {}", diagnostic);
            self.entries.push(diagnostic);
        }
    }

    pub fn has(&self, code: &str) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
