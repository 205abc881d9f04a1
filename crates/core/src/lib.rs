//! Core library for utilbelt
//!
//! This crate implements the **Functional Core** of the utilbelt project,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The utilbelt project uses a two-crate architecture to enforce separation
//! of concerns:
//!
//! - **`utilbelt_core`** (this crate): Pure transformation functions with zero I/O
//! - **`utilbelt`**: I/O operations and orchestration (the Imperative Shell)
//!
//! Every function here is deterministic given its input (the one exception
//! is [`guid`], whose whole job is randomness), performs no I/O, and can be
//! tested with plain fixture data. The shell crate owns logging, request
//! handling, and the process lifecycle.
//!
//! # Module Organization
//!
//! The core crate is organized by tool domain:
//!
//! - [`mht`]: MHT screenshot-recording fixer — image tag discovery, MIME
//!   part scanning, base64 extraction, and data-URL inlining
//! - [`hash`]: SHA1/SHA256/SHA512/MD5 hex digests
//! - [`jwt`]: JWT header/payload decoding (no signature verification)
//! - [`time`]: unix-time and date-string conversion
//! - [`cron`]: cron expression description and upcoming run times
//! - [`serialize`]: JSON to YAML and back
//! - [`guid`]: GUID-shaped identifier generation
//! - [`encoding`]: base64 text and image data-URL utilities
//!
//! Each module contains its domain models, the transformation functions,
//! and unit tests using fixture data (no mocking).

pub mod cron;
pub mod encoding;
pub mod guid;
pub mod hash;
pub mod jwt;
pub mod mht;
pub mod serialize;
pub mod time;
