pub mod acquisition;
pub mod http;
pub mod orchestrator;
pub mod progress;

pub use acquisition::{AuditService, RunningAudit};
pub use orchestrator::{AuditPhase, AuditState, Orchestrator};
pub use progress::{ProgressSimulator, ProgressStep, DEFAULT_STEPS};
