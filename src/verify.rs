//! Output Verification
//!
//! Structural well-formedness checks on generated sections. Markup is reparsed with
//! html5ever and compared with the shape the Tree Builder emitted; script is parsed
//! with oxc. Findings are diagnostics only and never change the output.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::diagnostics::{Diagnostics, DIAG_MALFORMED_OUTPUT};
use crate::markup::MarkupShape;

/// Element count and nesting depth of `html` as a browser would build it, counted
/// from the children of `<body>`.
pub fn parse_markup_shape(html: &str) -> Option<MarkupShape> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .ok()?;

    let body = find_element(&dom.document, "body")?;
    let mut shape = MarkupShape::default();
    let mut pending: Vec<(Handle, usize)> = body
        .children
        .borrow()
        .iter()
        .map(|child| (child.clone(), 1))
        .collect();

    while let Some((handle, depth)) = pending.pop() {
        if let NodeData::Element { .. } = handle.data {
            shape.elements += 1;
            shape.max_depth = shape.max_depth.max(depth);
            pending.extend(
                handle
                    .children
                    .borrow()
                    .iter()
                    .map(|child| (child.clone(), depth + 1)),
            );
        }
    }
    Some(shape)
}

/// First element named `tag` in document order.
fn find_element(root: &Handle, tag: &str) -> Option<Handle> {
    let mut pending = vec![root.clone()];
    while let Some(handle) = pending.pop() {
        if let NodeData::Element { name, .. } = &handle.data {
            if &*name.local == tag {
                return Some(handle);
            }
        }
        pending.extend(handle.children.borrow().iter().rev().cloned());
    }
    None
}

/// Parse errors reported for `source` as an ES module.
pub fn script_errors(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);
    let ret = Parser::new(&allocator, source, source_type).parse();

    let mut errors: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
    if ret.panicked && errors.is_empty() {
        errors.push("parser aborted".to_string());
    }
    errors
}

/// Compare reparsed markup with what was emitted.
pub fn verify_markup(html: &str, emitted: MarkupShape, diagnostics: &mut Diagnostics) {
    match parse_markup_shape(html) {
        Some(parsed) if parsed == emitted => {}
        Some(parsed) => diagnostics.report(
            DIAG_MALFORMED_OUTPUT,
            format!(
                "markup reparses to {} element(s) at depth {}, emitted {} at depth {}",
                parsed.elements, parsed.max_depth, emitted.elements, emitted.max_depth
            ),
            None,
        ),
        None => diagnostics.report(DIAG_MALFORMED_OUTPUT, "markup could not be reparsed", None),
    }
}

pub fn verify_script(js: &str, diagnostics: &mut Diagnostics) {
    for error in script_errors(js) {
        diagnostics.report(DIAG_MALFORMED_OUTPUT, format!("script: {}", error), None);
    }
}
