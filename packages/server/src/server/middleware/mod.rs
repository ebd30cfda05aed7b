pub mod agent_identity;

pub use agent_identity::{AuthAgent, AGENT_ID_HEADER};
