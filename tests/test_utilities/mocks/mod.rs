/// Mock implementations for testing
mod mock_detector;
mod mock_progress_reporter;
mod mock_reference_lookup;

pub use mock_detector::{call_count, MockDetector};
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_reference_lookup::MockReferenceLookup;
