//! Row processing shared by the reader and the writer.
//!
//! - `operations`: cell transforms and the built-in operation DSL
//! - `callbacks`: selector → transforms bindings applied to rows
//! - `projector`: record ↔ row projection
//! - `keys`: key derivation with duplicate detection

pub mod callbacks;
pub mod keys;
pub mod operations;
pub mod projector;

pub use callbacks::{CallbackBinding, CallbackPipeline, Selector, PATTERN_PREFIX};
pub use keys::KeyDeriver;
pub use operations::{operations_description, Operation, Transform};
