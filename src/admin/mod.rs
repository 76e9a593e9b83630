//! Admin module
//!
//! Operations that act on other users' namespaces or on the account list.
//! Each one requires an admin [`Session`](crate::session::Session).

mod operations;

// Re-export public types and functions
pub use operations::{
    OwnerSummary, add_user, owner_files, owner_summaries, read_owner_file, remove_user,
};
