//! Warden Core - Foundation types shared across the Warden crates.
//!
//! This crate provides:
//! - [`Principal`], the identifier of an identity held by a subject
//! - [`Carrier`], an opaque handle to whatever transport object the host
//!   associates with an interaction (for example a request/response pair)
//!
//! It has no dependencies on the other Warden crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod carrier;
mod principal;

pub use carrier::Carrier;
pub use principal::Principal;
