//! Domain module
//!
//! Inspection templates, inspection instances and assignments, with the
//! validation and role rules that govern them.

pub mod aggregates;
pub mod events;
pub mod prebuilt;
pub mod services;
pub mod value_objects;

pub use aggregates::*;
pub use events::*;
pub use services::*;
pub use value_objects::*;
