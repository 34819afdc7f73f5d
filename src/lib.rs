//! Vidblur Client
//!
//! This library provides the job lifecycle client for the vidblur video
//! redaction service: upload validation and submission, per-job status
//! polling until a terminal state, an in-memory job registry, and result
//! retrieval. The service's processing pipeline is an external collaborator
//! reached only through its HTTP contract.

pub mod config;
pub mod events;
pub mod models;
pub mod services;
pub mod session;
