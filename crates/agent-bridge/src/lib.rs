//! Agent bridge
//!
//! The seam between the flow core and the vision/action-generating agent:
//! the [`ActionProposer`] trait, bounded conversation memory, a scripted
//! mock for tests, and an HTTP client for an agent sidecar.

pub mod errors;
pub mod http;
pub mod memory;
pub mod mock;
pub mod proposer;

pub use errors::ProposerError;
pub use http::HttpProposer;
pub use memory::{ConversationMemory, MemoryEntry, MemoryKind, DEFAULT_MEMORY_CAPACITY};
pub use mock::MockProposer;
pub use proposer::{ActionProposer, Credentials, ProposalContext};
