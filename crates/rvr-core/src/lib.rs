//! Chat turn loop for RVR Chat: the model talks, the robot server acts.

mod agent;

pub use agent::{Agent, AgentEvent, MAX_TOOL_ROUNDS};
