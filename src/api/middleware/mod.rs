//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Owner extractor: rejects requests the gateway did not attribute
//! 2. Audit logger: logs after the owner is known

pub mod audit;
pub mod owner;
