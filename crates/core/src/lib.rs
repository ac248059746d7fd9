#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and pure logic for the verse clock.

pub mod catalog;
pub mod model;
pub mod policy;
pub mod select;
pub mod time;

pub use catalog::{CatalogFormatError, VerseCatalog};
pub use model::*;
pub use policy::{AttemptPolicy, RunKind};
pub use select::{draw_order, draw_order_with, DrawOrder};
pub use time::to_target;
