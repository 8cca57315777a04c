//! Document Assembler
//!
//! Runs the builders over one graph snapshot and joins their sections into the
//! single fenced document handed to the generation layer. Header wording and fence
//! labels are read by that layer and must not drift.

use serde::{Deserialize, Serialize};

use crate::cache::compute_hash;
use crate::config::{file_name, CompileOptions};
use crate::diagnostics::{Diagnostic, Diagnostics, DIAG_NO_ROOT};
use crate::graph::{Edge, Graph, Node, PlanInput};
use crate::logic::LogicCompiler;
use crate::markup::MarkupBuilder;
use crate::roots::{resolve_roots, NO_ROOT_MESSAGE};
use crate::styles::render_rules;
use crate::verify::{verify_markup, verify_script};

pub const SCRIPT_HEADER: &str = "/* --- JavaScript Logic --- */\n";
pub const PAGE_READY_OPEN: &str = "document.addEventListener('DOMContentLoaded', () => {\n";
pub const PAGE_READY_CLOSE: &str = "});\n";
pub const NO_LOGIC_COMMENT: &str = "// No JavaScript logic defined in the visual plan.\n";

pub const CLOSING_INSTRUCTION: &str = "Please generate the three files exactly as described. The application should be a polished, functional, and visually appealing translation of this plan. Ensure the final result is a 'SOOOOOOO GOOOOOD' quality product.";

/// Result of one compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledPlan {
    /// The assembled document, or the no-root explanation.
    pub document: String,
    pub html: String,
    pub css: String,
    pub js: String,
    pub has_root: bool,
    /// SHA-256 of `document`.
    pub fingerprint: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile ordered nodes and edges with default options and return the document.
pub fn compile(nodes: &[Node], edges: &[Edge]) -> String {
    compile_graph(&Graph::from_parts(nodes, edges), &CompileOptions::default()).document
}

pub fn compile_plan(input: &PlanInput, options: &CompileOptions) -> CompiledPlan {
    compile_graph(&Graph::new(input), options)
}

pub fn compile_graph(graph: &Graph, options: &CompileOptions) -> CompiledPlan {
    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(graph.build_diagnostics().iter().cloned());

    let roots = resolve_roots(graph);
    if roots.is_empty() {
        diagnostics.report(
            DIAG_NO_ROOT,
            "no HTML node without a parent connection",
            None,
        );
        let document = NO_ROOT_MESSAGE.to_string();
        return CompiledPlan {
            fingerprint: compute_hash(&document),
            document,
            html: String::new(),
            css: String::new(),
            js: String::new(),
            has_root: false,
            diagnostics: diagnostics.into_vec(),
        };
    }

    let mut markup = MarkupBuilder::new(graph, options, &mut diagnostics);
    let html = markup.render_roots(&roots);
    let shape = markup.shape();

    let css = render_rules(graph, options, &mut diagnostics);

    // Listener code sits one level inside the page-ready wrapper.
    let logic = LogicCompiler::new(graph, options, &mut diagnostics).render(1);
    let js = script_section(&logic);

    if options.verify_output {
        verify_markup(&html, shape, &mut diagnostics);
        verify_script(&js, &mut diagnostics);
    }

    let document = assemble_document(&html, &css, &js, options);
    log::debug!(
        "[PlanCompiler] compiled {} root(s), {} element(s)",
        roots.len(),
        shape.elements
    );
    if !diagnostics.is_empty() {
        log::debug!("[PlanCompiler] {} item(s) skipped or degraded", diagnostics.len());
    }

    CompiledPlan {
        fingerprint: compute_hash(&document),
        document,
        html,
        css,
        js,
        has_root: true,
        diagnostics: diagnostics.into_vec(),
    }
}

/// Script file body: the logic wrapped once in a page-ready block, or a
/// placeholder comment when there is none.
pub fn script_section(logic: &str) -> String {
    let mut js = String::from(SCRIPT_HEADER);
    if logic.trim().is_empty() {
        js.push_str(NO_LOGIC_COMMENT);
    } else {
        js.push_str(PAGE_READY_OPEN);
        js.push_str(logic);
        js.push_str(PAGE_READY_CLOSE);
    }
    js
}

pub fn assemble_document(html: &str, css: &str, js: &str, options: &CompileOptions) -> String {
    let mut doc = format!(
        "Generate a comprehensive, single-page web application based on the following detailed plan. The application's structure, styling, and interactivity are explicitly defined below. Create three files: `{}`, `{}`, and `{}`.\n\n",
        options.html_path, options.stylesheet_path, options.script_path
    );

    doc.push_str(&format!("### File: `{}`\n", options.html_path));
    doc.push_str(&format!(
        "This file should contain the following HTML structure. It must link to `./{}` and `./{}`.\n",
        file_name(&options.stylesheet_path),
        file_name(&options.script_path)
    ));
    doc.push_str(&fenced("html", html));

    doc.push_str(&format!("### File: `{}`\n", options.stylesheet_path));
    doc.push_str("This file should contain the following CSS rules.\n");
    doc.push_str(&fenced("css", css));

    doc.push_str(&format!("### File: `{}`\n", options.script_path));
    doc.push_str("This file should contain the following JavaScript logic.\n");
    doc.push_str(&fenced("javascript", js));

    doc.push_str(CLOSING_INSTRUCTION);
    doc
}

fn fenced(label: &str, body: &str) -> String {
    format!("```{}\n{}```\n\n", label, body)
}
