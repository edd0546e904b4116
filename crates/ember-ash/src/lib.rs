//! Ember ASH
//!
//! Reliable framed serial link between a host and an Ember mesh radio
//! dongle. Frames are byte-stuffed, CRC protected and acknowledged with a
//! sliding window of up to four DATA frames.
//!
//! The link is sans-IO: [`LinkFramer`] consumes bytes and instants and
//! produces bytes, timer deadlines and [`LinkEvent`]s. Whoever owns the
//! serial port decides how to wait.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Instant;
//! use ember_ash::{LinkConfig, LinkEvent, LinkFramer};
//!
//! let mut link = LinkFramer::new(LinkConfig::default())?;
//! link.reset(Instant::now());
//! while let Some(bytes) = link.poll_transmit() {
//!     port.write_all(&bytes)?;
//! }
//! // ... later, for every read:
//! link.receive(&buf[..n], Instant::now());
//! while let Some(event) = link.poll_event() {
//!     if let LinkEvent::Delivered(payload) = event {
//!         handle(payload);
//!     }
//! }
//! ```

pub mod constants;

mod config;
mod control;
mod error;
mod frame;
mod framer;
mod random;
mod stuffing;
mod timer;

pub use config::*;
pub use control::*;
pub use error::*;
pub use frame::*;
pub use framer::*;
pub use random::*;
pub use stuffing::*;
pub use timer::*;
