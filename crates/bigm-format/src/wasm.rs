//! WASM bindings for the bigm solver
//!
//! Inputs are LP files in the text format accepted by [`crate::parse_input`];
//! results come back as plain JavaScript objects.

use wasm_bindgen::prelude::*;

use bigm_solver::{Solver, SolutionStatus};

use crate::parser::{parse_input, parse_reference};

/// Solve an LP given as input-file text and return the result as JSON
#[wasm_bindgen]
pub fn solve(source: &str, big_m: Option<f64>) -> Result<JsValue, JsValue> {
    let input = parse_input(source).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let mut solver = Solver::new();
    if let Some(big_m) = big_m {
        solver = solver.with_big_m(big_m);
    }

    let started = js_sys::Date::now();
    let solution = solver
        .solve(&input.to_problem())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let elapsed_ms = js_sys::Date::now() - started;

    let result = SolveResult {
        status: solution.status,
        objective: solution.objective_value,
        values: solution.values,
        iterations: solution.iterations,
        elapsed_ms,
    };
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(serde::Serialize)]
struct SolveResult {
    status: SolutionStatus,
    objective: Option<f64>,
    values: Option<Vec<f64>>,
    iterations: usize,
    elapsed_ms: f64,
}

/// Validate input-file text and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source, parse_input(source).err());
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Validate reference-solution text and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate_reference(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source, parse_reference(source).err());
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

#[derive(serde::Serialize)]
struct Diagnostic {
    line: Option<usize>,
    start: usize,
    end: usize,
    severity: String,
    message: String,
}

fn get_diagnostics(source: &str, error: Option<crate::ParseError>) -> Vec<Diagnostic> {
    let Some(e) = error else {
        return Vec::new();
    };
    let (start, end) = match &e {
        crate::ParseError::UnexpectedToken { span, .. } => (span.start, span.end),
        _ => (0, source.len()),
    };
    vec![Diagnostic {
        line: e.line(),
        start,
        end,
        severity: "error".to_string(),
        message: e.to_string(),
    }]
}
