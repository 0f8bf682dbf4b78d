//! # OpenConvert client
//!
//! Client library and CLI for the OpenConvert agent network: independent,
//! network-reachable agents advertise file-format conversions, and this
//! crate discovers which agent can perform a requested conversion,
//! dispatches the file to it, correlates the asynchronous reply, and
//! aggregates results across batches with partial-failure tolerance.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use openconvert::client::convert_single;
//! use openconvert::config::Settings;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     convert_single(
//!         settings,
//!         Path::new("notes.txt"),
//!         Path::new("notes.md"),
//!         None, // detect source format from extension
//!         None, // detect target format from extension
//!         None, // no conversion prompt
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The orchestration core depends only on two narrow port traits,
//! [`domain::DiscoveryPort`] and [`domain::MessagingPort`]; the WebSocket
//! adapter in [`adapters::ws`] implements both over the real network.
//! Conversions are processed strictly one at a time; the correlator's
//! response map is the only shared mutable state.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod formats;

pub use client::{convert_single, OpenConvertClient};
pub use error::{ConvertError, ConvertResult};
