//! Analysis orchestration and result aggregation
//!
//! Combines the analyzer outputs into a final verdict:
//! - Result types
//! - Pipeline (analyzer fan-out)
//! - Decision synthesis
//! - Report metadata

pub mod decision;
pub mod metadata;
pub mod pipeline;
pub mod result;
