use serde::Serialize;

/// Pipeline stage a diagnostic originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Filter,
    Sort,
}

/// One per-field failure swallowed during a pass.
///
/// A failing field never aborts the pass and never surfaces as an error;
/// integrators that need visibility read these back via
/// [`FilterEngine::diagnostics`](crate::FilterEngine::diagnostics) or
/// [`FilterEngine::finish_with_diagnostics`](crate::FilterEngine::finish_with_diagnostics).
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub field: String,
    pub message: String,
}
