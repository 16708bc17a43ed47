//! # accessledger
//!
//! HTTP front of `AccessLedger`: a read-only file gateway behind an
//! authenticating proxy. Every successful read is recorded in the audit
//! pipeline and mailed per user once they go quiet.
//!
//! ## Routes
//!
//! - `GET <paths.user>`: the caller's identity and permissions as JSON
//! - `GET <paths.api>[/<path>]`: a directory listing or the file itself
//!
//! Unknown identities get 403. Paths that do not exist, are hidden, or are
//! not authorized all get 404.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod gate;
pub mod model;

pub use gate::{AppState, AuthenticatedUser, GateError, build_router};
pub use model::ListingEntry;
