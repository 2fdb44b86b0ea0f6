// Layout: font metrics, inline markup, line breaking, the document renderer and
// skill-line fitting.
// Rendering is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod fit;
pub mod font_metrics;
pub mod line_break;
pub mod markup;
pub mod pdf;
pub mod renderer;

// Re-export the public API consumed by other modules (assembly, handlers).
pub use fit::{fit_list, fit_skills, FitReport};
pub use pdf::PdfRenderer;
pub use renderer::DocumentRenderer;
