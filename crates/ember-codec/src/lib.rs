//! Ember Codec
//!
//! Binary type codec and command-framing model for talking to an Ember mesh
//! radio dongle (EZSP) and to the devices behind it (ZCL).
//!
//! # Layers
//!
//! - [`WireType`] / [`Value`]: a closed set of wire representations and the
//!   values they carry, with [`encode`] and [`decode`] between them.
//! - [`FieldWriter`] / [`FieldReader`]: one-pass cursors that frames use to
//!   write and read their fields in declared order.
//! - [`Frame`]: one typed command, identified by a [`FrameId`] of group id,
//!   command id and [`Direction`].
//! - [`FrameRegistry`]: maps identities to constructors so inbound bytes can
//!   be turned into the right concrete frame.
//! - [`ezsp`] and [`zcl`]: header codecs for the two frame families.
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_codec::catalog::{self, ezsp::VersionRequest};
//! use ember_codec::ezsp::{decode_ezsp, encode_ezsp};
//!
//! let registry = catalog::ezsp_registry();
//! let bytes = encode_ezsp(0, &VersionRequest { desired_protocol_version: 8 })?;
//! let framed = decode_ezsp(&bytes, &registry)?;
//! assert!(framed.frame_as::<VersionRequest>().is_some());
//! ```

mod codec;
mod error;
mod field;
mod frame;
mod registry;
mod types;
mod wire;

pub mod catalog;
pub mod ezsp;
pub mod zcl;

pub use codec::*;
pub use error::*;
pub use field::*;
pub use frame::*;
pub use registry::*;
pub use types::*;
pub use wire::*;
