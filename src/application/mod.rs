/// Application layer - Use cases, DTOs and the shared analysis runtime
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
/// The resilience envelope, result cache and request throttle live here
/// because every analysis in the process shares them.
pub mod cache;
pub mod dto;
pub mod factories;
pub mod monitor;
pub mod resilience;
pub mod runtime;
pub mod throttle;
pub mod use_cases;
