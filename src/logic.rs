//! Logic Compiler
//!
//! Turns event nodes and their action chains into JavaScript statements.
//!
//! Each outgoing `action_out` edge of an event starts an independent chain. A chain
//! walks `action_out` edges one node at a time and emits one statement per action.
//! When an action has several successors, the first continues the chain and the
//! others are compiled afterwards, at the same indentation, as parallel branches.
//!
//! The delay action (`js_action_set_timeout`) ends the outer walk: its first
//! successor is compiled one level deeper inside a `setTimeout` callback and
//! nothing after the delay resumes at the outer level.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::catalogue::{Action, EventKind, NodeKind};
use crate::config::CompileOptions;
use crate::diagnostics::{
    Diagnostics, DIAG_CYCLE, DIAG_EMPTY_ACTION_CHAIN, DIAG_EXTRA_BINDING, DIAG_NOT_AN_ACTION,
    DIAG_UNBOUND_EVENT, DIAG_UNREACHABLE_AFTER_DELAY,
};
use crate::graph::{Graph, GraphNode, HANDLE_ACTION_OUT, HANDLE_ELEMENT_IN};

pub const LOAD_COMMENT: &str = "/* On page load actions */";

lazy_static! {
    static ref UNSAFE_IDENT_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_$]").unwrap();
}

pub struct LogicCompiler<'a> {
    graph: &'a Graph,
    options: &'a CompileOptions,
    diagnostics: &'a mut Diagnostics,
    /// element id -> variable declared for it in the current wrapper scope
    bindings: HashMap<String, String>,
    declared: HashSet<String>,
}

impl<'a> LogicCompiler<'a> {
    pub fn new(
        graph: &'a Graph,
        options: &'a CompileOptions,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            graph,
            options,
            diagnostics,
            bindings: HashMap::new(),
            declared: HashSet::new(),
        }
    }

    /// Compile every event node, in node order, with listener code at `base_depth`.
    ///
    /// The output is one scope: each element is looked up once, however many
    /// events bind to it.
    pub fn render(&mut self, base_depth: usize) -> String {
        let graph = self.graph;
        let mut out = String::new();
        self.bindings.clear();
        self.declared.clear();
        for node in graph.nodes() {
            if let NodeKind::Event(kind) = node.kind {
                self.compile_event(node, kind, base_depth, &mut out);
            }
        }
        out
    }

    fn compile_event(&mut self, event: &'a GraphNode, kind: EventKind, depth: usize, out: &mut String) {
        let element_id = if kind.is_global() {
            None
        } else {
            match self.resolve_binding(event) {
                Some(id) => Some(id),
                None => {
                    self.diagnostics.report(
                        DIAG_UNBOUND_EVENT,
                        format!("'{}' event has no bound element with an id", kind.dom_name()),
                        Some(&event.id),
                    );
                    return;
                }
            }
        };

        // Listener bodies sit inside `if (...) {` and `addEventListener(..., () => {`.
        let statement_depth = if element_id.is_some() { depth + 2 } else { depth };

        let graph = self.graph;
        let mut body = String::new();
        for edge in graph.outgoing(&event.id, HANDLE_ACTION_OUT) {
            self.compile_chain(&edge.target_id, statement_depth, &mut body);
        }

        if body.is_empty() {
            self.diagnostics.report(
                DIAG_EMPTY_ACTION_CHAIN,
                format!("'{}' event has no actions", kind.dom_name()),
                Some(&event.id),
            );
            return;
        }

        let pad = self.options.pad(depth);
        match element_id {
            None => {
                out.push_str(&format!("\n{}{}\n", pad, LOAD_COMMENT));
                out.push_str(&body);
            }
            Some(id) => {
                let inner = self.options.pad(depth + 1);
                let (var, first_use) = self.binding_var(id);
                out.push('\n');
                if first_use {
                    out.push_str(&format!(
                        "{pad}const {var} = document.getElementById('{id}');\n",
                        pad = pad,
                        var = var,
                        id = js_string(id)
                    ));
                }
                out.push_str(&format!("{}if ({}) {{\n", pad, var));
                out.push_str(&format!(
                    "{}{}.addEventListener('{}', () => {{\n",
                    inner,
                    var,
                    kind.dom_name()
                ));
                out.push_str(&body);
                out.push_str(&format!("{}}});\n{}}}\n", inner, pad));
            }
        }
    }

    /// Id of the element bound through the first `element_in` edge, if that
    /// element has one.
    fn resolve_binding(&mut self, event: &GraphNode) -> Option<&'a str> {
        let graph = self.graph;
        let mut bindings = graph.incoming(&event.id, HANDLE_ELEMENT_IN);
        let first = bindings.next()?;

        let extra = bindings.count();
        if extra > 0 {
            self.diagnostics.report(
                DIAG_EXTRA_BINDING,
                format!("{} extra element binding(s) ignored", extra),
                Some(&event.id),
            );
        }

        match &graph.node(&first.source_id)?.kind {
            NodeKind::Element(props) => props.id.as_deref(),
            _ => None,
        }
    }

    /// Compile the chain starting at `start`. Forks and delayed blocks are queued
    /// on an explicit stack; one visited set covers the whole chain.
    fn compile_chain(&mut self, start: &'a str, depth: usize, out: &mut String) {
        let mut visited = HashSet::new();
        let mut tasks = vec![ChainTask::Walk { start, depth }];

        while let Some(task) = tasks.pop() {
            match task {
                ChainTask::Walk { start, depth } => {
                    self.walk(start, depth, &mut visited, &mut tasks, out);
                }
                ChainTask::CloseDelay {
                    open_at,
                    body_at,
                    depth,
                    millis,
                } => {
                    if out.len() == body_at {
                        // Nothing compiled inside the delayed block.
                        out.truncate(open_at);
                    } else {
                        out.push_str(&format!("{}}}, {});\n", self.options.pad(depth), millis));
                    }
                }
            }
        }
    }

    /// Follow the first `action_out` edge from `start` until the chain ends, a node
    /// repeats, or a delay is reached.
    fn walk(
        &mut self,
        start: &'a str,
        depth: usize,
        visited: &mut HashSet<&'a str>,
        tasks: &mut Vec<ChainTask<'a>>,
        out: &mut String,
    ) {
        let graph = self.graph;
        let pad = self.options.pad(depth);
        let mut forks: Vec<&'a str> = Vec::new();
        let mut delayed: Option<(&'a str, u64)> = None;
        let mut current = Some(start);

        while let Some(node_id) = current.take() {
            let Some(node) = graph.node(node_id) else {
                break;
            };
            if !visited.insert(node_id) {
                self.diagnostics.report(
                    DIAG_CYCLE,
                    "action chain loops back, branch cut",
                    Some(node_id),
                );
                break;
            }
            log::trace!("[PlanCompiler] action {} at depth {}", node_id, depth);

            let mut successors = graph
                .outgoing(node_id, HANDLE_ACTION_OUT)
                .map(|edge| edge.target_id.as_str());

            match &node.kind {
                NodeKind::Action(Action::Delay { millis }) => {
                    // The delayed block swallows the rest of this branch; nothing
                    // chained after the delay resumes at this level.
                    delayed = successors.next().map(|next| (next, *millis));
                    let unreachable = successors.count();
                    if unreachable > 0 {
                        self.diagnostics.report(
                            DIAG_UNREACHABLE_AFTER_DELAY,
                            format!("{} edge(s) after the delay are never compiled", unreachable),
                            Some(node_id),
                        );
                    }
                    break;
                }
                NodeKind::Action(action) => {
                    if let Some(stmt) = statement(action) {
                        out.push_str(&pad);
                        out.push_str(&stmt);
                        out.push('\n');
                    }
                }
                _ => {
                    self.diagnostics.report(
                        DIAG_NOT_AN_ACTION,
                        format!("'{}' inside an action chain emits nothing", node.type_tag),
                        Some(node_id),
                    );
                }
            }

            current = successors.next();
            forks.extend(successors);
        }

        // Stack order: delayed body, then its closing line, then forks in edge order.
        for fork in forks.into_iter().rev() {
            tasks.push(ChainTask::Walk { start: fork, depth });
        }
        if let Some((next, millis)) = delayed {
            let open_at = out.len();
            out.push_str(&format!("{}setTimeout(() => {{\n", pad));
            tasks.push(ChainTask::CloseDelay {
                open_at,
                body_at: out.len(),
                depth,
                millis,
            });
            tasks.push(ChainTask::Walk {
                start: next,
                depth: depth + 1,
            });
        }
    }

    /// Variable holding the element looked up for `element_id`, and whether this
    /// is its first use. Distinct ids that sanitize to the same name get a suffix.
    fn binding_var(&mut self, element_id: &str) -> (String, bool) {
        if let Some(var) = self.bindings.get(element_id) {
            return (var.clone(), false);
        }

        let base = format!("element_{}", binding_ident(element_id));
        let mut var = base.clone();
        let mut suffix = 2;
        while self.declared.contains(&var) {
            var = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.declared.insert(var.clone());
        self.bindings.insert(element_id.to_string(), var.clone());
        (var, true)
    }
}

enum ChainTask<'g> {
    Walk {
        start: &'g str,
        depth: usize,
    },
    /// Close a `setTimeout` opened at byte `open_at` whose body starts at `body_at`.
    CloseDelay {
        open_at: usize,
        body_at: usize,
        depth: usize,
        millis: u64,
    },
}

/// The single statement an action compiles to. Delays have no statement of
/// their own.
pub fn statement(action: &Action) -> Option<String> {
    let stmt = match action {
        Action::Alert { message } => format!("alert('{}');", js_string(message)),
        Action::ConsoleLog { message } => format!("console.log('{}');", js_string(message)),
        Action::ToggleClass { selector, class_name } => format!(
            "document.querySelector('{}')?.classList.toggle('{}');",
            js_string(selector),
            js_string(class_name)
        ),
        Action::AddClass { selector, class_name } => format!(
            "document.querySelector('{}')?.classList.add('{}');",
            js_string(selector),
            js_string(class_name)
        ),
        Action::RemoveClass { selector, class_name } => format!(
            "document.querySelector('{}')?.classList.remove('{}');",
            js_string(selector),
            js_string(class_name)
        ),
        Action::SetText { selector, text } => format!(
            "document.querySelector('{}').textContent = '{}';",
            js_string(selector),
            js_string(text)
        ),
        Action::SetAttribute {
            selector,
            attribute,
            value,
        } => format!(
            "document.querySelector('{}')?.setAttribute('{}', '{}');",
            js_string(selector),
            js_string(attribute),
            js_string(value)
        ),
        Action::SetCssProperty {
            selector,
            property,
            value,
        } => format!(
            "document.querySelector('{}').style.{} = '{}';",
            js_string(selector),
            property,
            js_string(value)
        ),
        Action::FetchApi { url } => format!(
            "fetch('{}').then(res => res.json()).then(data => console.log(data));",
            js_string(url)
        ),
        Action::Redirect { url } => format!("window.location.href = '{}';", js_string(url)),
        Action::Delay { .. } => return None,
    };
    Some(stmt)
}

/// Body of a single-quoted JavaScript string literal.
pub fn js_string(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Element id as the suffix of a JavaScript variable name.
pub fn binding_ident(element_id: &str) -> String {
    UNSAFE_IDENT_CHARS.replace_all(element_id, "_").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn compile(nodes: Vec<Node>, edges: Vec<Edge>) -> (String, Diagnostics) {
        let graph = Graph::from_parts(&nodes, &edges);
        let options = CompileOptions::default();
        let mut diags = Diagnostics::new();
        let js = LogicCompiler::new(&graph, &options, &mut diags).render(1);
        (js, diags)
    }

    fn log(id: &str, message: &str) -> Node {
        Node::new(id, "js_action_console_log").with("message", message)
    }

    #[test]
    fn test_click_binding() {
        let (js, _) = compile(
            vec![
                Node::new("b", "html_button").with("id", "go"),
                Node::new("e", "js_event_on_click"),
                Node::new("a", "js_action_alert").with("message", "hi"),
            ],
            vec![Edge::binding("b", "e"), Edge::sequence("e", "a")],
        );
        assert_eq!(
            js,
            "\n  const element_go = document.getElementById('go');\n  if (element_go) {\n    element_go.addEventListener('click', () => {\n      alert('hi');\n    });\n  }\n"
        );
    }

    #[test]
    fn test_load_event_needs_no_element() {
        let (js, _) = compile(
            vec![Node::new("e", "js_event_on_load"), log("a", "ready")],
            vec![Edge::sequence("e", "a")],
        );
        assert_eq!(js, "\n  /* On page load actions */\n  console.log('ready');\n");
    }

    #[test]
    fn test_unbound_event_skipped() {
        let (js, diags) = compile(
            vec![
                Node::new("b", "html_button"),
                Node::new("e", "js_event_on_click"),
                log("a", "x"),
            ],
            vec![Edge::binding("b", "e"), Edge::sequence("e", "a")],
        );
        assert_eq!(js, "");
        assert!(diags.has(DIAG_UNBOUND_EVENT));
    }

    #[test]
    fn test_event_without_actions_skipped() {
        let (js, diags) = compile(
            vec![
                Node::new("b", "html_button").with("id", "go"),
                Node::new("e", "js_event_on_click"),
            ],
            vec![Edge::binding("b", "e")],
        );
        assert_eq!(js, "");
        assert!(diags.has(DIAG_EMPTY_ACTION_CHAIN));
    }

    #[test]
    fn test_delay_nests_and_terminates() {
        let (js, _) = compile(
            vec![
                Node::new("e", "js_event_on_load"),
                log("a", "a"),
                Node::new("d", "js_action_set_timeout").with("delay", 500u64),
                log("b", "b"),
            ],
            vec![
                Edge::sequence("e", "a"),
                Edge::sequence("a", "d"),
                Edge::sequence("d", "b"),
            ],
        );
        assert_eq!(
            js,
            "\n  /* On page load actions */\n  console.log('a');\n  setTimeout(() => {\n    console.log('b');\n  }, 500);\n"
        );
    }

    #[test]
    fn test_edges_after_delay_unreachable() {
        let (js, diags) = compile(
            vec![
                Node::new("e", "js_event_on_load"),
                Node::new("d", "js_action_set_timeout").with("delay", 10u64),
                log("in", "inside"),
                log("out", "outside"),
            ],
            vec![
                Edge::sequence("e", "d"),
                Edge::sequence("d", "in"),
                Edge::sequence("d", "out"),
            ],
        );
        assert!(js.contains("    console.log('inside');\n"));
        assert!(!js.contains("outside"));
        assert!(diags.has(DIAG_UNREACHABLE_AFTER_DELAY));
    }

    #[test]
    fn test_delay_without_successor_emits_nothing() {
        let (js, diags) = compile(
            vec![
                Node::new("e", "js_event_on_load"),
                Node::new("d", "js_action_set_timeout").with("delay", 10u64),
            ],
            vec![Edge::sequence("e", "d")],
        );
        assert_eq!(js, "");
        assert!(diags.has(DIAG_EMPTY_ACTION_CHAIN));
    }

    #[test]
    fn test_multiple_chains_from_event() {
        let (js, _) = compile(
            vec![Node::new("e", "js_event_on_load"), log("a", "one"), log("b", "two")],
            vec![Edge::sequence("e", "a"), Edge::sequence("e", "b")],
        );
        let one = js.find("'one'").unwrap();
        let two = js.find("'two'").unwrap();
        assert!(one < two);
    }

    #[test]
    fn test_action_fork_compiled_after_chain() {
        let (js, _) = compile(
            vec![
                Node::new("e", "js_event_on_load"),
                log("a", "start"),
                log("b", "main"),
                log("c", "main-next"),
                log("f", "fork"),
            ],
            vec![
                Edge::sequence("e", "a"),
                Edge::sequence("a", "b"),
                Edge::sequence("a", "f"),
                Edge::sequence("b", "c"),
            ],
        );
        let order: Vec<_> = ["'start'", "'main'", "'main-next'", "'fork'"]
            .iter()
            .map(|m| js.find(m).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(js.contains("\n  console.log('fork');\n"));
    }

    #[test]
    fn test_action_cycle_terminates() {
        let (js, diags) = compile(
            vec![Node::new("e", "js_event_on_load"), log("a", "a"), log("b", "b")],
            vec![
                Edge::sequence("e", "a"),
                Edge::sequence("a", "b"),
                Edge::sequence("b", "a"),
            ],
        );
        assert_eq!(js.matches("console.log").count(), 2);
        assert!(diags.has(DIAG_CYCLE));
    }

    #[test]
    fn test_non_action_nodes_pass_through() {
        let (js, diags) = compile(
            vec![
                Node::new("e", "js_event_on_load"),
                Node::new("x", "js_action_vibrate"),
                log("a", "after"),
            ],
            vec![Edge::sequence("e", "x"), Edge::sequence("x", "a")],
        );
        assert!(js.contains("console.log('after');"));
        assert!(diags.has(DIAG_NOT_AN_ACTION));
    }

    #[test]
    fn test_statement_templates() {
        let stmt = statement(&Action::SetCssProperty {
            selector: "#box".into(),
            property: "backgroundColor".into(),
            value: "red".into(),
        });
        assert_eq!(
            stmt.as_deref(),
            Some("document.querySelector('#box').style.backgroundColor = 'red';")
        );
        let stmt = statement(&Action::ToggleClass {
            selector: ".menu".into(),
            class_name: "open".into(),
        });
        assert_eq!(
            stmt.as_deref(),
            Some("document.querySelector('.menu')?.classList.toggle('open');")
        );
        assert_eq!(statement(&Action::Delay { millis: 1 }), None);
    }

    #[test]
    fn test_string_escaping_and_idents() {
        assert_eq!(js_string("it's"), "it\\'s");
        assert_eq!(js_string("a\\b\nc"), "a\\\\b\\nc");
        assert_eq!(binding_ident("main-btn.primary"), "main_btn_primary");
    }

    #[test]
    fn test_extra_binding_reported() {
        let (js, diags) = compile(
            vec![
                Node::new("b1", "html_button").with("id", "first"),
                Node::new("b2", "html_button").with("id", "second"),
                Node::new("e", "js_event_on_mouseover"),
                log("a", "hover"),
            ],
            vec![
                Edge::binding("b1", "e"),
                Edge::binding("b2", "e"),
                Edge::sequence("e", "a"),
            ],
        );
        assert!(js.contains("getElementById('first')"));
        assert!(js.contains("addEventListener('mouseover'"));
        assert!(!js.contains("second"));
        assert!(diags.has(DIAG_EXTRA_BINDING));
    }

    #[test]
    fn test_two_events_share_one_lookup() {
        let (js, _) = compile(
            vec![
                Node::new("b", "html_button").with("id", "go"),
                Node::new("click", "js_event_on_click"),
                Node::new("hover", "js_event_on_mouseover"),
                log("a", "clicked"),
                log("h", "hovered"),
            ],
            vec![
                Edge::binding("b", "click"),
                Edge::binding("b", "hover"),
                Edge::sequence("click", "a"),
                Edge::sequence("hover", "h"),
            ],
        );
        assert_eq!(js.matches("const element_go").count(), 1);
        assert_eq!(js.matches("if (element_go) {").count(), 2);
        assert!(js.contains("element_go.addEventListener('click'"));
        assert!(js.contains("element_go.addEventListener('mouseover'"));
        assert!(js.find("const element_go").unwrap() < js.find("'mouseover'").unwrap());
    }

    #[test]
    fn test_colliding_idents_get_distinct_variables() {
        let (js, _) = compile(
            vec![
                Node::new("b1", "html_button").with("id", "a-b"),
                Node::new("b2", "html_button").with("id", "a_b"),
                Node::new("e1", "js_event_on_click"),
                Node::new("e2", "js_event_on_click"),
                log("l1", "one"),
                log("l2", "two"),
            ],
            vec![
                Edge::binding("b1", "e1"),
                Edge::binding("b2", "e2"),
                Edge::sequence("e1", "l1"),
                Edge::sequence("e2", "l2"),
            ],
        );
        assert!(js.contains("const element_a_b = document.getElementById('a-b');"));
        assert!(js.contains("const element_a_b_2 = document.getElementById('a_b');"));
        assert!(js.contains("element_a_b_2.addEventListener('click'"));
    }

    #[test]
    fn test_delay_into_visited_node_emits_no_block() {
        let (js, diags) = compile(
            vec![
                Node::new("e", "js_event_on_load"),
                log("a", "a"),
                Node::new("d", "js_action_set_timeout").with("delay", 100u64),
            ],
            vec![
                Edge::sequence("e", "a"),
                Edge::sequence("a", "d"),
                Edge::sequence("d", "a"),
            ],
        );
        assert_eq!(js, "\n  /* On page load actions */\n  console.log('a');\n");
        assert!(diags.has(DIAG_CYCLE));
    }

    #[test]
    fn test_deep_delay_nesting_does_not_recurse() {
        const DEPTH: usize = 5000;
        let mut nodes = vec![Node::new("e", "js_event_on_load")];
        let mut edges = vec![Edge::sequence("e", "d0")];
        for i in 0..DEPTH {
            nodes.push(Node::new(&format!("d{}", i), "js_action_set_timeout").with("delay", 1u64));
            let next = if i + 1 == DEPTH { "last".to_string() } else { format!("d{}", i + 1) };
            edges.push(Edge::sequence(&format!("d{}", i), &next));
        }
        nodes.push(log("last", "done"));

        let graph = Graph::from_parts(&nodes, &edges);
        let options = CompileOptions {
            indent: String::new(),
            ..CompileOptions::default()
        };
        let mut diags = Diagnostics::new();
        let js = LogicCompiler::new(&graph, &options, &mut diags).render(0);

        assert_eq!(js.matches("setTimeout(() => {").count(), DEPTH);
        assert_eq!(js.matches("}, 1);").count(), DEPTH);
        assert!(js.contains("setTimeout(() => {\nconsole.log('done');\n}, 1);\n"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_deep_fork_nesting_does_not_recurse() {
        const DEPTH: usize = 5000;
        let mut nodes = vec![Node::new("e", "js_event_on_load")];
        let mut edges = vec![Edge::sequence("e", "a0")];
        for i in 0..DEPTH {
            nodes.push(log(&format!("a{}", i), "step"));
            nodes.push(log(&format!("x{}", i), "leaf"));
            // First edge continues the chain; the second is a fork queued behind it.
            edges.push(Edge::sequence(&format!("a{}", i), &format!("x{}", i)));
            if i + 1 < DEPTH {
                edges.push(Edge::sequence(&format!("a{}", i), &format!("a{}", i + 1)));
            }
        }
        let (js, diags) = compile(nodes, edges);

        assert_eq!(js.matches("  console.log('step');\n").count(), DEPTH);
        assert_eq!(js.matches("  console.log('leaf');\n").count(), DEPTH);
        assert!(js.ends_with("  console.log('step');\n  console.log('leaf');\n"));
        assert!(diags.is_empty());
    }
}

