mod guard;
mod orchestrator;
mod sink;

pub use guard::{RunGuard, RunRegistry};
pub use orchestrator::{AgentOrchestrator, PipelineError, PipelineOutput};
pub use sink::{BestEffortSink, EventSink, TransportClosed};
