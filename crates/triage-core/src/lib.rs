//! # triage-core
//!
//! Core types for the Triage incident backend.
//!
//! This crate provides the foundational, I/O-free pieces shared across all
//! Triage crates:
//! - Entity structs for incidents and their audited collections
//! - Status enums with the incident state machine
//! - ID prefix constants
//! - Cross-cutting error types
//! - Deterministic canonicalization of audit payloads
//! - Keyed integrity digests (HMAC-SHA256) over canonical text
//! - Status lifecycle planning with first-write-only milestones
//! - Projection of an incident snapshot into its audited payload

pub mod canonical;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod integrity;
pub mod lifecycle;
pub mod payload;
