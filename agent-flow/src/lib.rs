pub mod agent;
pub mod conversation;
pub mod error;
pub mod fetch;
pub mod interpret;
pub mod poll;
pub mod query;
#[cfg(feature = "rig")]
pub mod rig_llm;

// Re-export commonly used types
pub use agent::{Agent, AgentSettings};
pub use conversation::{
    Conversation, ConversationFactory, EXTRACTION_PREAMBLE, extract_structured,
};
pub use error::{AgentError, Result, Stage, StageFailure};
pub use fetch::{Fetcher, SubmissionHandle, results_file_name, save_results};
pub use interpret::{Interpreter, read_first_n_lines};
pub use poll::{PollMachine, PollState, Poller, Probe};
pub use query::{ApiQuery, QueryBuilder};
#[cfg(feature = "rig")]
pub use rig_llm::{RigConversation, rig_conversation_factory};
