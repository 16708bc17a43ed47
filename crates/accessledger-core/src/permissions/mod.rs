//! Permission sets and the table that holds them.

mod model;
mod table;

pub use model::{Permissions, WILDCARD};
pub use table::PermissionTable;
