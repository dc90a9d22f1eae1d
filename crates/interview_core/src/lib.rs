pub mod domain;
pub mod events;
pub mod lifecycle;
pub mod ports;
pub mod scheduling;

pub use domain::{Event, EventTime, Person, ScheduleRequest, ScheduleResult, TranscriptLine};
pub use events::{Disclosure, EventCard, EventPanel, EventsView, ProcessingState};
pub use lifecycle::{LoadPhase, TimeoutCeiling};
pub use ports::{
    DirectoryService, EventFeedService, PortError, PortResult, ProcessingTrigger, ScheduleProxy,
    UpstreamForwarder, UpstreamReply,
};
pub use scheduling::{BookingState, FailureKind, SchedulingView, SimulationState};
