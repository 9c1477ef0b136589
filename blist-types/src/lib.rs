//! # blist-types
//!
//! Foundational types for the buddy-list and presence core.
//!
//! This crate provides the types shared by every other crate:
//! - [`NodeId`], [`AccountId`] - Identity types
//! - [`Value`], [`ValueKind`] - Typed settings and attribute values
//! - [`StatusPrimitive`] - The closed set of status kinds
//! - [`MediaCaps`] - Buddy media capability flags
//! - [`BlistError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod caps;
mod error;
mod ids;
mod primitive;
mod value;

pub use caps::MediaCaps;
pub use error::BlistError;
pub use ids::{AccountId, NodeId};
pub use primitive::StatusPrimitive;
pub use value::{Value, ValueKind};
