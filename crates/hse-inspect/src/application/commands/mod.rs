//! Command handlers
//!
//! Application services that orchestrate use cases around the stores.

mod assignment_service;
mod inspection_service;
mod template_service;

pub use assignment_service::AssignmentService;
pub use inspection_service::InspectionService;
pub use template_service::TemplateService;

use crate::domain::events::DomainEvent;
use crate::ports::outbound::EventPublisher;

/// Publish events of a write that is already stored. A publisher failure is
/// logged and never turns the committed write into an error.
async fn publish_committed(publisher: &dyn EventPublisher, events: Vec<DomainEvent>) {
    if events.is_empty() {
        return;
    }
    let count = events.len();
    if let Err(e) = publisher.publish(events).await {
        tracing::warn!(error = %e, count, "Events not published after committed write");
    }
}
