//! Utility modules: size caps with truncation markers.

pub mod truncate;

pub use truncate::{cap_head, cap_tail, truncate_utf8, TRUNCATION_MARKER};
