//! # Visual Plan Compiler Ground Truth
//!
//! Compiles an editor graph of HTML, CSS and JavaScript nodes into one fenced
//! document describing `index.html`, `style.css` and `script.js`.
//!
//! ## Compilation Invariants
//!
//! 1. **Pure Function**: the same ordered nodes, edges and options always produce the
//!    byte-identical document. No clock, randomness or hash-map iteration order leaks
//!    into output; every traversal follows input order.
//!
//! 2. **Total**: compilation never fails. Anything unusable is skipped and reported as
//!    a [`Diagnostic`]. Only decoding a JSON snapshot can return a [`PlanError`].
//!
//! 3. **Roots**: an HTML node with no live incoming `parent` edge is a root. No roots
//!    means the whole result is the no-root explanation and nothing else.
//!
//! 4. **Once Per Node**: a node is rendered at most once per structural walk and at
//!    most once per action chain. Cycles are cut, never followed.
//!
//! 5. **Single Wrapper**: all listener code sits inside exactly one page-ready block.
//!
//! 6. **Delay Terminates**: a delay nests its first successor inside `setTimeout`;
//!    nothing chained after it resumes at the outer level.

#[cfg(feature = "napi")]
mod bridge;

mod assemble;
mod batch;
mod cache;
mod catalogue;
mod config;
mod diagnostics;
mod error;
mod graph;
mod logic;
mod markup;
mod roots;
mod styles;
mod verify;


pub use assemble::{assemble_document, compile, compile_graph, compile_plan, CompiledPlan};
pub use batch::compile_batch;
pub use cache::{compute_hash, CompileCache, DEFAULT_CACHE_CAPACITY};
pub use catalogue::{Action, Category, ElementProps, EventKind, NodeKind, StyleDeclaration};
pub use config::CompileOptions;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{PlanError, Result};
pub use graph::{AttributeValue, Attributes, Edge, Graph, GraphNode, Node, PlanInput};
pub use markup::MarkupShape;
pub use roots::{resolve_roots, NO_ROOT_MESSAGE};
pub use verify::{parse_markup_shape, script_errors};

#[cfg(feature = "napi")]
pub use bridge::{compile_flow_native, compile_plan_native, compile_plan_report_native};
