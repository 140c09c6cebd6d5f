//! Infrastructure layer
//!
//! Store and publisher implementations for the outbound ports.

pub mod events;
pub mod persistence;

pub use events::{NoOpEventPublisher, RecordingEventPublisher, TracingEventPublisher};
pub use persistence::{
    FileStore, InMemoryAssignmentStore, InMemoryInspectionStore, InMemoryTemplateStore,
    InMemoryUserDirectory,
};
