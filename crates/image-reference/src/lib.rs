//! Container Image References
//!
//! Parses and retags the image references Talos uses for its installer
//! images (`[domain/]path[:tag][@digest]`). The reference grammar itself is
//! provided by `oci_distribution`.
//!
//! # Example
//!
//! ```
//! use image_reference::ImageReference;
//!
//! # fn main() -> Result<(), image_reference::ReferenceError> {
//! let current: ImageReference = "factory.talos.dev/installer/abc123:v1.7.6".parse()?;
//! assert_eq!(current.name(), "factory.talos.dev/installer/abc123");
//!
//! let next = current.with_tag("v1.8.0")?;
//! assert_eq!(next.to_string(), "factory.talos.dev/installer/abc123:v1.8.0");
//! # Ok(())
//! # }
//! ```
//!
//! Only tagged references are accepted: an installer image must always be
//! retaggable, so untagged and digest-only references are rejected with
//! [`ReferenceError::NotTagged`].

pub mod error;
pub mod reference;

pub use error::ReferenceError;
pub use reference::ImageReference;
