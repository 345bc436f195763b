//! Foundation types for the weft persistent collections.
//!
//! Every other weft crate depends on `weft-types`. It holds the pieces that
//! have no behaviour of their own but must agree across crates.
//!
//! # Key Types
//!
//! - [`CollectionError`]: failure taxonomy shared by maps, sets, cursors and graphs
//! - [`Age`]: monotonically increasing generation stamp given to backing storage

pub mod age;
pub mod error;

pub use age::Age;
pub use error::{CollectionError, CollectionResult};
