//! Format detection and parsing.
//!
//! A [`FormatRegistry`] holds every known [`FormatHandler`]. Given a payload
//! and the name it was ingested under, the registry decides which format it
//! is ([`FormatRegistry::decide_format`]) and the chosen handler turns it into
//! deduplicatable [`ParsedRecord`]s. Adding a format means implementing the
//! trait and registering it; callers never match on format ids.

mod bundle;
mod consts;
pub mod error;
mod handler;
pub mod handlers;
mod registry;

pub use crate::handler::{FormatHandler, ParseContext, ParsedRecord, record_hash};
pub use crate::registry::FormatRegistry;
