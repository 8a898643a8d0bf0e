/// Ports: the traits the analysis core is written against
///
/// `inbound` is what drivers (the CLI) call; `outbound` is what the core
/// needs from detectors, reference data and the console.
pub mod inbound;
pub mod outbound;
