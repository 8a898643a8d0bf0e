//! Carbon dating domain: component model, risk policy and the scoring engine.
//!
//! Everything in this layer is pure: no I/O, no clocks. Callers pass `now`
//! explicitly so results are reproducible.
pub mod domain;
pub mod policies;
pub mod services;
