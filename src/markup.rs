//! Tree Builder
//!
//! Renders HTML element nodes and their structural children as indented markup.
//!
//! ## Rules
//!
//! 1. Attributes are written in a fixed order (`id`, `class`, `src`, `alt`, `href`,
//!    `for`, `placeholder`, `type`, `value`, then a bare `controls`), whatever order
//!    the editor stored them in.
//! 2. A node with any outgoing `children` edge renders as a block; otherwise its
//!    inline text sits between the tags on one line. Children always win.
//! 3. Every node renders at most once per compilation. A second parent, or a cycle
//!    back to an ancestor, skips that branch.
//! 4. The walk keeps its own stack instead of recursing, so nesting depth is
//!    bounded by memory, not by the thread stack.

use std::collections::HashSet;

use crate::catalogue::{ElementProps, NodeKind};
use crate::config::CompileOptions;
use crate::diagnostics::{Diagnostics, DIAG_CYCLE, DIAG_DUPLICATE_PARENT};
use crate::graph::{Graph, GraphNode, HANDLE_CHILDREN};

pub const MARKUP_HEADER: &str = "<!-- --- HTML Structure --- -->\n";

/// Element count and nesting depth of what a builder emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupShape {
    pub elements: usize,
    /// Levels of nesting; a lone root is depth 1.
    pub max_depth: usize,
}

/// Pending work of the explicit traversal stack.
enum Step<'g> {
    Open { node_id: &'g str, depth: usize },
    Close { node_id: &'g str, tag: &'g str, depth: usize },
}

pub struct MarkupBuilder<'a> {
    graph: &'a Graph,
    options: &'a CompileOptions,
    diagnostics: &'a mut Diagnostics,
    rendered: HashSet<String>,
    ancestors: HashSet<String>,
    shape: MarkupShape,
}

impl<'a> MarkupBuilder<'a> {
    pub fn new(
        graph: &'a Graph,
        options: &'a CompileOptions,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            graph,
            options,
            diagnostics,
            rendered: HashSet::new(),
            ancestors: HashSet::new(),
            shape: MarkupShape::default(),
        }
    }

    /// Header comment followed by every root's tree.
    pub fn render_roots(&mut self, roots: &[&GraphNode]) -> String {
        let mut out = String::from(MARKUP_HEADER);
        for root in roots {
            out.push_str(&self.render(&root.id, 0));
        }
        out
    }

    /// Render one node at `depth`. Missing and non-HTML nodes render as nothing.
    pub fn render(&mut self, node_id: &str, depth: usize) -> String {
        let graph = self.graph;
        let mut out = String::new();
        let mut steps = vec![Step::Open { node_id, depth }];

        while let Some(step) = steps.pop() {
            let (node_id, depth) = match step {
                Step::Open { node_id, depth } => (node_id, depth),
                Step::Close { node_id, tag, depth } => {
                    self.ancestors.remove(node_id);
                    out.push_str(&format!("{}</{}>\n", self.options.pad(depth), tag));
                    continue;
                }
            };

            let Some(node) = graph.node(node_id) else {
                continue;
            };
            let NodeKind::Element(props) = &node.kind else {
                continue;
            };

            if self.ancestors.contains(node_id) {
                self.diagnostics.report(
                    DIAG_CYCLE,
                    format!("structural cycle back to <{}>, branch skipped", props.tag),
                    Some(node_id),
                );
                continue;
            }
            if !self.rendered.insert(node_id.to_string()) {
                self.diagnostics.report(
                    DIAG_DUPLICATE_PARENT,
                    format!("<{}> already rendered under another parent", props.tag),
                    Some(node_id),
                );
                continue;
            }
            log::trace!("[PlanCompiler] markup {} at depth {}", node_id, depth);

            self.shape.elements += 1;
            self.shape.max_depth = self.shape.max_depth.max(depth + 1);

            let indent = self.options.pad(depth);
            out.push_str(&format!("{}<{}{}>", indent, props.tag, render_attributes(props)));

            let children: Vec<&str> = graph
                .outgoing(node_id, HANDLE_CHILDREN)
                .map(|edge| edge.target_id.as_str())
                .collect();

            if children.is_empty() {
                out.push_str(props.text.as_deref().unwrap_or(""));
                out.push_str(&format!("</{}>\n", props.tag));
                continue;
            }

            out.push('\n');
            self.ancestors.insert(node_id.to_string());
            steps.push(Step::Close {
                node_id,
                tag: &props.tag,
                depth,
            });
            // Reversed so the first child is popped first.
            for child in children.into_iter().rev() {
                steps.push(Step::Open {
                    node_id: child,
                    depth: depth + 1,
                });
            }
        }
        out
    }

    pub fn shape(&self) -> MarkupShape {
        self.shape
    }
}

fn render_attributes(props: &ElementProps) -> String {
    let mut attrs = String::new();
    for (key, value) in props.ordered_attributes() {
        attrs.push_str(&format!(" {}=\"{}\"", key, value.replace('"', "&quot;")));
    }
    if props.controls {
        attrs.push_str(" controls");
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn render(nodes: Vec<Node>, edges: Vec<Edge>, root: &str) -> (String, Diagnostics) {
        let graph = Graph::from_parts(&nodes, &edges);
        let options = CompileOptions::default();
        let mut diags = Diagnostics::new();
        let out = MarkupBuilder::new(&graph, &options, &mut diags).render(root, 0);
        (out, diags)
    }

    #[test]
    fn test_inline_text_leaf() {
        let (out, _) = render(
            vec![Node::new("1", "html_h1").with("id", "title").with("childrenText", "Hello")],
            vec![],
            "1",
        );
        assert_eq!(out, "<h1 id=\"title\">Hello</h1>\n");
    }

    #[test]
    fn test_leaf_without_text_and_controls() {
        let (out, _) = render(
            vec![Node::new("v", "html_video").with("src", "a.mp4").with("controls", true)],
            vec![],
            "v",
        );
        assert_eq!(out, "<video src=\"a.mp4\" controls></video>\n");
    }

    #[test]
    fn test_nested_indentation_and_closing_order() {
        let (out, _) = render(
            vec![
                Node::new("a", "html_main"),
                Node::new("b", "html_section"),
                Node::new("c", "html_p").with("childrenText", "deep"),
            ],
            vec![Edge::structural("a", "b"), Edge::structural("b", "c")],
            "a",
        );
        assert_eq!(
            out,
            "<main>\n  <section>\n    <p>deep</p>\n  </section>\n</main>\n"
        );
    }

    #[test]
    fn test_children_win_over_text() {
        let (out, _) = render(
            vec![
                Node::new("a", "html_div").with("childrenText", "ignored"),
                Node::new("b", "html_span").with("childrenText", "kept"),
            ],
            vec![Edge::structural("a", "b")],
            "a",
        );
        assert!(!out.contains("ignored"));
        assert!(out.contains("  <span>kept</span>\n"));
    }

    #[test]
    fn test_missing_and_non_html_render_empty() {
        let (out, _) = render(vec![Node::new("c", "css_color")], vec![], "c");
        assert_eq!(out, "");
        let (out, _) = render(vec![], vec![], "nope");
        assert_eq!(out, "");
    }

    #[test]
    fn test_quotes_in_attribute_values() {
        let (out, _) = render(
            vec![Node::new("i", "html_input_text").with("placeholder", "say \"hi\"")],
            vec![],
            "i",
        );
        assert_eq!(
            out,
            "<input placeholder=\"say &quot;hi&quot;\" type=\"text\"></input>\n"
        );
    }

    #[test]
    fn test_cycle_below_root_is_cut() {
        let (out, diags) = render(
            vec![Node::new("a", "html_div"), Node::new("b", "html_div")],
            vec![Edge::structural("a", "b"), Edge::structural("b", "a")],
            "a",
        );
        assert_eq!(out, "<div>\n  <div>\n  </div>\n</div>\n");
        assert!(diags.has(DIAG_CYCLE));
    }

    #[test]
    fn test_second_parent_is_skipped() {
        let nodes = vec![
            Node::new("a", "html_div"),
            Node::new("b", "html_div"),
            Node::new("shared", "html_p"),
        ];
        let edges = vec![
            Edge::structural("a", "shared"),
            Edge::structural("b", "shared"),
        ];
        let graph = Graph::from_parts(&nodes, &edges);
        let options = CompileOptions::default();
        let mut diags = Diagnostics::new();
        let mut builder = MarkupBuilder::new(&graph, &options, &mut diags);
        let first = builder.render("a", 0);
        let second = builder.render("b", 0);
        let shape = builder.shape();

        assert!(first.contains("<p></p>"));
        assert_eq!(second, "<div>\n</div>\n");
        assert_eq!(shape, MarkupShape { elements: 3, max_depth: 2 });
        assert!(diags.has(DIAG_DUPLICATE_PARENT));
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        const DEPTH: usize = 5000;
        let nodes: Vec<Node> = (0..DEPTH)
            .map(|i| Node::new(&i.to_string(), "html_div"))
            .collect();
        let edges: Vec<Edge> = (1..DEPTH)
            .map(|i| Edge::structural(&(i - 1).to_string(), &i.to_string()))
            .collect();
        let graph = Graph::from_parts(&nodes, &edges);
        let options = CompileOptions {
            indent: String::new(),
            ..CompileOptions::default()
        };
        let mut diags = Diagnostics::new();
        let mut builder = MarkupBuilder::new(&graph, &options, &mut diags);
        let out = builder.render("0", 0);
        let shape = builder.shape();

        assert_eq!(shape, MarkupShape { elements: DEPTH, max_depth: DEPTH });
        assert_eq!(out.matches("<div>").count(), DEPTH);
        assert_eq!(out.matches("</div>").count(), DEPTH);
        assert!(out.starts_with("<div>\n<div>\n"));
        assert!(out.ends_with("<div></div>\n</div>\n</div>\n"));
        assert!(diags.is_empty());
    }
}
