//! Configuration for Metaflask.
//!
//! Settings live in `.metaflask/config.yaml` and are passed explicitly to the
//! components that open the checkout or talk to remote services.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
