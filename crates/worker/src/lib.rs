//! The conversion worker application.
//!
//! Wires the domain, persistence, and catalog layers into a long-lived
//! process: a poll loop pops jobs off the queue, the converter drives
//! each job through its state machine, and the matcher resolves tracks
//! against the target catalog with bounded parallelism.

pub mod config;
pub mod converter;
pub mod matcher;
pub mod worker;
