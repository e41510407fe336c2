pub mod participant_ctx;
pub mod participant_flow;

pub use participant_ctx::ParticipantCtx;
pub use participant_flow::{ParticipantFlow, ParticipantOutcome};
