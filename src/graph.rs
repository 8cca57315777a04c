//! Graph Model
//!
//! Wire records for nodes and edges, and the read-only [`Graph`] every builder
//! traverses. Construction classifies each node once and indexes live edges by
//! port; nothing here mutates after `Graph::new` returns.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::catalogue::{Category, NodeKind};
use crate::diagnostics::{
    Diagnostic, DIAG_DANGLING_EDGE, DIAG_DUPLICATE_NODE_ID, DIAG_UNKNOWN_NODE_TYPE,
};
use crate::error::{PlanError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// HANDLES
// ═══════════════════════════════════════════════════════════════════════════════

pub const HANDLE_CHILDREN: &str = "children";
pub const HANDLE_PARENT: &str = "parent";
pub const HANDLE_STYLE_OUT: &str = "style_out";
pub const HANDLE_STYLE: &str = "style";
pub const HANDLE_EVENT: &str = "event";
pub const HANDLE_ELEMENT_IN: &str = "element_in";
pub const HANDLE_ACTION_OUT: &str = "action_out";
pub const HANDLE_ACTION_IN: &str = "action_in";

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

pub type Attributes = BTreeMap<String, AttributeValue>;

/// A raw attribute value as the editor stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Null, arrays and objects. Never rendered.
    Other(serde_json::Value),
}

impl AttributeValue {
    /// Text form of a present value: non-empty strings, numbers, and `true`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Text(s) if !s.is_empty() => Some(s.clone()),
            AttributeValue::Number(n) => Some(n.to_string()),
            AttributeValue::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// JavaScript truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttributeValue::Bool(b) => *b,
            AttributeValue::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
            AttributeValue::Text(s) => !s.is_empty(),
            AttributeValue::Other(v) => !v.is_null(),
        }
    }

    pub fn as_millis(&self) -> Option<u64> {
        let raw = match self {
            AttributeValue::Number(n) => n.as_f64()?,
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if raw.is_finite() && raw >= 0.0 {
            Some(raw.round() as u64)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub type_tag: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Node {
    pub fn new(id: &str, type_tag: &str) -> Self {
        Node {
            id: id.to_string(),
            type_tag: type_tag.to_string(),
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Number(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_id: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target_id: String,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn new(source_id: &str, source_handle: &str, target_id: &str, target_handle: &str) -> Self {
        Edge {
            source_id: source_id.to_string(),
            source_handle: Some(source_handle.to_string()),
            target_id: target_id.to_string(),
            target_handle: Some(target_handle.to_string()),
        }
    }

    /// `children` -> `parent`
    pub fn structural(parent: &str, child: &str) -> Self {
        Self::new(parent, HANDLE_CHILDREN, child, HANDLE_PARENT)
    }

    /// `style_out` -> `style`
    pub fn style(declaration: &str, element: &str) -> Self {
        Self::new(declaration, HANDLE_STYLE_OUT, element, HANDLE_STYLE)
    }

    /// `event` -> `element_in`
    pub fn binding(element: &str, event: &str) -> Self {
        Self::new(element, HANDLE_EVENT, event, HANDLE_ELEMENT_IN)
    }

    /// `action_out` -> `action_in`
    pub fn sequence(from: &str, to: &str) -> Self {
        Self::new(from, HANDLE_ACTION_OUT, to, HANDLE_ACTION_IN)
    }

    pub fn source_handle(&self) -> &str {
        self.source_handle.as_deref().unwrap_or("")
    }

    pub fn target_handle(&self) -> &str {
        self.target_handle.as_deref().unwrap_or("")
    }
}

/// The full compiler input: ordered nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl PlanInput {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        PlanInput { nodes, edges }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(PlanError::InvalidInput)
    }

    /// Decode the canvas export the editor saves: node fields live under `data`,
    /// with the type tag in `data.nodeType`, and edges use `source`/`target`.
    pub fn from_flow_json(json: &str) -> Result<Self> {
        let export: FlowExport = serde_json::from_str(json).map_err(PlanError::InvalidInput)?;
        Ok(export.into())
    }
}

#[derive(Debug, Deserialize)]
struct FlowExport {
    #[serde(default)]
    nodes: Vec<FlowNode>,
    #[serde(default)]
    edges: Vec<FlowEdge>,
}

#[derive(Debug, Deserialize)]
struct FlowNode {
    id: String,
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowEdge {
    source: String,
    #[serde(default)]
    source_handle: Option<String>,
    target: String,
    #[serde(default)]
    target_handle: Option<String>,
}

impl From<FlowExport> for PlanInput {
    fn from(export: FlowExport) -> Self {
        let nodes = export
            .nodes
            .into_iter()
            .map(|flow| {
                let mut data = flow.data;
                let type_tag = match data.remove("nodeType") {
                    Some(serde_json::Value::String(tag)) => tag,
                    _ => String::new(),
                };
                let attributes = data
                    .into_iter()
                    .map(|(key, value)| {
                        let value = serde_json::from_value(value.clone())
                            .unwrap_or(AttributeValue::Other(value));
                        (key, value)
                    })
                    .collect();
                Node {
                    id: flow.id,
                    type_tag,
                    attributes,
                }
            })
            .collect();

        let edges = export
            .edges
            .into_iter()
            .map(|e| Edge {
                source_id: e.source,
                source_handle: e.source_handle,
                target_id: e.target,
                target_handle: e.target_handle,
            })
            .collect();

        PlanInput { nodes, edges }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRAPH
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub type_tag: String,
    pub kind: NodeKind,
}

type PortKey = (String, String);

/// Read-only view over one graph snapshot.
///
/// Only live edges (both endpoints resolve) are reachable through the port
/// lookups. Duplicate node ids resolve to the first node.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    /// (source_id, source_handle) -> live edge indices, in edge order
    outgoing: HashMap<PortKey, Vec<usize>>,
    /// (target_id, target_handle) -> live edge indices, in edge order
    incoming: HashMap<PortKey, Vec<usize>>,
    build_diagnostics: Vec<Diagnostic>,
}

impl Graph {
    pub fn new(input: &PlanInput) -> Self {
        Self::from_parts(&input.nodes, &input.edges)
    }

    pub fn from_parts(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut build_diagnostics = Vec::new();
        let mut graph_nodes = Vec::with_capacity(nodes.len());
        let mut index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if index.contains_key(&node.id) {
                build_diagnostics.push(Diagnostic::new(
                    DIAG_DUPLICATE_NODE_ID,
                    format!("duplicate node id, '{}' node ignored", node.type_tag),
                    Some(&node.id),
                ));
                continue;
            }

            let kind = NodeKind::classify(&node.type_tag, &node.attributes);
            if kind == NodeKind::Unknown {
                let message = match Category::of_type_tag(&node.type_tag) {
                    Some(category) => format!(
                        "unknown node type '{}' in the {:?} namespace",
                        node.type_tag, category
                    ),
                    None => format!("unknown node type '{}'", node.type_tag),
                };
                build_diagnostics.push(Diagnostic::new(
                    DIAG_UNKNOWN_NODE_TYPE,
                    message,
                    Some(&node.id),
                ));
            }

            index.insert(node.id.clone(), graph_nodes.len());
            graph_nodes.push(GraphNode {
                id: node.id.clone(),
                type_tag: node.type_tag.clone(),
                kind,
            });
        }

        let mut outgoing: HashMap<PortKey, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<PortKey, Vec<usize>> = HashMap::new();

        for (i, edge) in edges.iter().enumerate() {
            let missing = [&edge.source_id, &edge.target_id]
                .into_iter()
                .find(|id| !index.contains_key(id.as_str()));
            if let Some(missing) = missing {
                build_diagnostics.push(Diagnostic::new(
                    DIAG_DANGLING_EDGE,
                    format!(
                        "edge {} ({}) -> {} ({}) references missing node '{}'",
                        edge.source_id,
                        edge.source_handle(),
                        edge.target_id,
                        edge.target_handle(),
                        missing
                    ),
                    None,
                ));
                continue;
            }

            outgoing
                .entry((edge.source_id.clone(), edge.source_handle().to_string()))
                .or_default()
                .push(i);
            incoming
                .entry((edge.target_id.clone(), edge.target_handle().to_string()))
                .or_default()
                .push(i);
        }

        log::trace!(
            "[PlanCompiler] graph built: {} nodes, {} edges, {} out-ports, {} in-ports",
            graph_nodes.len(),
            edges.len(),
            outgoing.len(),
            incoming.len()
        );

        Graph {
            nodes: graph_nodes,
            index,
            edges: edges.to_vec(),
            outgoing,
            incoming,
            build_diagnostics,
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Nodes in input order, duplicates removed.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Live edges leaving `node_id` through `handle`, in edge order.
    pub fn outgoing<'a>(&'a self, node_id: &str, handle: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        Self::port(&self.outgoing, node_id, handle)
            .iter()
            .map(move |&i| &self.edges[i])
    }

    /// Live edges entering `node_id` through `handle`, in edge order.
    pub fn incoming<'a>(&'a self, node_id: &str, handle: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        Self::port(&self.incoming, node_id, handle)
            .iter()
            .map(move |&i| &self.edges[i])
    }

    pub fn has_incoming(&self, node_id: &str, handle: &str) -> bool {
        !Self::port(&self.incoming, node_id, handle).is_empty()
    }

    /// Diagnostics found while building the graph (duplicates, dangling edges,
    /// unknown types).
    pub fn build_diagnostics(&self) -> &[Diagnostic] {
        &self.build_diagnostics
    }

    fn port<'a>(map: &'a HashMap<PortKey, Vec<usize>>, node_id: &str, handle: &str) -> &'a [usize] {
        map.get(&(node_id.to_string(), handle.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
