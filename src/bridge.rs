//! JavaScript host bindings, built with the `napi` feature.

use napi_derive::napi;

use crate::assemble::compile_plan;
use crate::config::CompileOptions;
use crate::error::PlanError;
use crate::graph::PlanInput;

fn to_napi(e: PlanError) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn options_from(options_json: Option<String>) -> napi::Result<CompileOptions> {
    match options_json {
        Some(json) => CompileOptions::from_json(&json).map_err(to_napi),
        None => Ok(CompileOptions::default()),
    }
}

/// Compile a canonical `{ nodes, edges }` plan and return the document.
#[napi]
pub fn compile_plan_native(input_json: String, options_json: Option<String>) -> napi::Result<String> {
    let input = PlanInput::from_json(&input_json).map_err(to_napi)?;
    let options = options_from(options_json)?;
    Ok(compile_plan(&input, &options).document)
}

/// Compile the editor's canvas export and return the document.
#[napi]
pub fn compile_flow_native(flow_json: String, options_json: Option<String>) -> napi::Result<String> {
    let input = PlanInput::from_flow_json(&flow_json).map_err(to_napi)?;
    let options = options_from(options_json)?;
    Ok(compile_plan(&input, &options).document)
}

/// Compile a canonical plan and return every section plus diagnostics.
#[napi]
pub fn compile_plan_report_native(
    input_json: String,
    options_json: Option<String>,
) -> napi::Result<serde_json::Value> {
    let input = PlanInput::from_json(&input_json).map_err(to_napi)?;
    let options = options_from(options_json)?;
    serde_json::to_value(compile_plan(&input, &options))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
