//! Cross-service choreography scenarios.

pub mod end_to_end;
