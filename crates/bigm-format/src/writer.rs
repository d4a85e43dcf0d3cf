/// Serialize a solution in reference format: objective on the first line,
/// the solution vector on the second.
pub fn write_reference(objective: f64, values: &[f64]) -> String {
    let values: Vec<String> = values.iter().map(|v| format!("{:.10}", v)).collect();
    format!("{:.10}\n{}\n", objective, values.join(" "))
}
