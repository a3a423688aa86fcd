#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! Startup-time secret materializer.
//!
//! A deployment hands the server a base64-encoded service-account blob in an
//! environment variable; the application expects a credential file on disk.
//! This crate bridges the two: look the variable up, decode it, check the
//! payload is well-formed JSON, and write it to the configured path. It runs
//! once per process start, before the application, and every failure is
//! terminal for the startup sequence.

mod env;
mod error;
mod materialize;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{MaterializeError, Result};
pub use materialize::{MaterializeOptions, Materializer, Report};
