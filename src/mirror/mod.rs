//! Offline client mirror.
//!
//! A local copy of save records and a local index that works without any
//! server. It is backed by an embedded fjall database, the client-side
//! counterpart of browser local storage, and is never read or written by
//! the server. Records are last-writer-wins per save id.

mod error;
mod format;
mod store;

pub use error::MirrorError;
pub use format::{ENVELOPE_VERSION, EnvelopeError};
pub use store::ClientMirror;
