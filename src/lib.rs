//! Major Bracket - elimination-tournament guidance for choosing a major
//!
//! Candidate categories are compared pairwise, winners advance round by
//! round, and the last three winners are summarized into a report. Every
//! step of a session runs in one unit of work under a per-session lock.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
