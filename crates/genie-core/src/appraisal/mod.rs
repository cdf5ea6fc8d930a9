//! Marketplace appraisal: prompts, answer shaping, and the guided session.

pub mod engine;
pub mod extract;
pub mod prompts;
pub mod session;
pub mod types;

pub use engine::Appraiser;
pub use session::{AppraisalSession, Step};
pub use types::{AppraisalRecord, AppraisalRequest, AppraisalResult, Condition};
