/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (HTTP endpoints, GitHub, reference
/// data, console, file system).
pub mod component_detector;
pub mod formatter;
pub mod manifest_parser;
pub mod output_presenter;
pub mod progress_reporter;
pub mod reference_lookup;

pub use component_detector::{ComponentDetector, DetectionOutcome};
pub use formatter::AnalysisFormatter;
pub use manifest_parser::ManifestParser;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use reference_lookup::ReferenceLookup;
