//! File actions module.
//!
//! Deletion of selected duplicates, either permanently or via the system
//! trash, with a size re-check before each removal.
//!
//! ```no_run
//! use dupsweep::actions::{delete_targets, DeleteConfig};
//!
//! let result = delete_targets(&[], &DeleteConfig::trash(), None);
//! assert_eq!(result.freed_bytes, 0);
//! ```

pub mod delete;

pub use delete::{
    delete_target, delete_targets, DeleteConfig, DeleteError, DeleteFailure, DeleteMode,
    DeletionResult,
};
