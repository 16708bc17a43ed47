//! Response models of the gate.

mod listing;

pub use listing::ListingEntry;
