//! Service layer: the intake pipeline and its external integrations.
//!
//! Contains the form collector, the analyzers, SOW rendering, the session
//! store and the clients for the generative API and the lead relay.

pub mod ai_client;
pub mod analysis;
pub mod intake_form;
pub mod lead_relay;
pub mod session_store;
pub mod sow;
pub mod submission;

pub use ai_client::AiClient;
pub use analysis::Analyzer;
pub use intake_form::{AdvanceOutcome, IntakeForm};
pub use lead_relay::LeadRelay;
pub use session_store::{RedisSessionStore, SessionStore};
pub use submission::Submission;
