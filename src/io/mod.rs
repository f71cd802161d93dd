//! Submission I/O
//!
//! Identity form and document image intake, plus image decoding.

pub mod decoder;
pub mod submission;
