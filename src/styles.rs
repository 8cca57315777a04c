//! Rule Builder
//!
//! One `#id { ... }` block per HTML node that has an id and incoming style edges.
//! Blocks follow node-list order; declarations follow edge order.

use crate::catalogue::NodeKind;
use crate::config::CompileOptions;
use crate::diagnostics::{Diagnostics, DIAG_INCOMPLETE_DECLARATION};
use crate::graph::{Graph, HANDLE_STYLE};

pub const STYLES_HEADER: &str = "/* --- CSS Styles --- */\n";

pub const DEFAULT_STYLES: &str = "body {\n  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif;\n  margin: 0;\n  padding: 2rem;\n  background-color: #f8f9fa;\n}\n\n";

pub const NO_RULES_COMMENT: &str = "/* No CSS rules defined in the visual plan. */\n";

pub fn render_rules(graph: &Graph, options: &CompileOptions, diagnostics: &mut Diagnostics) -> String {
    let mut css = String::from(STYLES_HEADER);
    css.push_str(DEFAULT_STYLES);

    let styled: Vec<_> = graph
        .nodes()
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Element(props) => props.id.as_deref().map(|id| (node, id)),
            _ => None,
        })
        .filter(|(node, _)| graph.has_incoming(&node.id, HANDLE_STYLE))
        .collect();

    if styled.is_empty() {
        css.push_str(NO_RULES_COMMENT);
        return css;
    }

    let indent = options.pad(1);
    for (node, element_id) in styled {
        let mut declarations = Vec::new();

        for edge in graph.incoming(&node.id, HANDLE_STYLE) {
            let Some(source) = graph.node(&edge.source_id) else {
                continue;
            };
            let NodeKind::Style(decl) = &source.kind else {
                continue;
            };
            match (decl.property.as_deref(), decl.value.as_deref()) {
                (Some(property), Some(value)) => {
                    declarations.push(format!("{}{}: {};", indent, property, value));
                }
                _ => diagnostics.report(
                    DIAG_INCOMPLETE_DECLARATION,
                    format!("declaration for #{} is missing a property or value", element_id),
                    Some(&source.id),
                ),
            }
        }

        if declarations.is_empty() {
            continue;
        }

        css.push_str(&format!("#{} {{\n", element_id));
        css.push_str(&declarations.join("\n"));
        css.push_str("\n}\n\n");
    }

    css
}
