//! Core type definitions used across the LearnHub workspace.

pub mod admission;
pub mod pagination;

pub use admission::{AdmissionOutcome, AdmissionSummary, Capacity, DenialReason};
pub use pagination::{PageRequest, PageResponse};
