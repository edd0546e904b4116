//! Ember Transport
//!
//! Request/response session with an Ember mesh radio dongle. The session
//! owns the byte channel and a reliable link, assigns correlation sequence
//! numbers to outbound frames, and matches inbound frames back to the
//! requests that are waiting for them.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ember_codec::catalog::{self, ezsp::{VersionRequest, VersionResponse}};
//! use ember_transport::{SessionConfig, TransportSession};
//!
//! let session = TransportSession::open(port, Arc::new(catalog::ezsp_registry()), SessionConfig::default()).await?;
//! session.subscribe(|frame| println!("callback: {:?}", frame.frame))?;
//!
//! let response = session
//!     .send(&VersionRequest { desired_protocol_version: 8 }, Duration::from_secs(1))?
//!     .await?;
//! let version = response.frame_as::<VersionResponse>().unwrap();
//! session.close().await;
//! ```

mod completion;
mod config;
mod error;
mod session;

pub use completion::*;
pub use config::*;
pub use error::*;
pub use session::*;
