//! Domain services
//!
//! Stateless rules shared by the aggregates and the application layer.

pub mod policy;
pub mod validator;

pub use policy::{Caller, Capabilities, Capability, Role, RolePolicy};
pub use validator::{
    check_value, first_incomplete, first_invalid, is_blank, is_complete, sanitize_section,
    BlockReason, SubmitBlock, ValueIssue,
};
