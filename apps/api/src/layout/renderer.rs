use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::variables::{TextStyle, VariableSet};

/// A fragment fits on one line when its laid-out height is within this factor of the
/// style's nominal leading. Absorbs rounding in the line-height arithmetic.
pub const SINGLE_LINE_TOLERANCE: f32 = 1.1;

/// The document renderer the fitting and finalize steps depend on.
///
/// `measure` must be a pure function of its arguments: the fit engine trims skill lists
/// by asking it repeatedly and relies on getting the same answer for the same input.
/// Rendering is CPU-bound; async callers run it inside `spawn_blocking`.
pub trait DocumentRenderer: Send + Sync {
    /// True if `fragment` (inline markup) renders on a single line of `max_width` points.
    fn measure(&self, fragment: &str, style: &TextStyle, max_width: f32) -> bool;

    /// Width available to body text between the page margins.
    fn usable_width(&self, vars: &VariableSet) -> f32;

    /// Lays out the whole record and returns the encoded document.
    fn render(&self, record: &ResumeRecord, vars: &VariableSet) -> Result<Vec<u8>, AppError>;
}
