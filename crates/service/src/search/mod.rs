//! Search view orchestration: state, transitions, and the async driver that sequences
//! remote calls against them.

pub mod orchestrator;
pub mod state;
pub mod view;

pub use orchestrator::SearchOrchestrator;
pub use state::{Applied, Failure, Operation, OperationStatus, SearchOutcome, SearchState};
pub use view::{ResultsState, SearchView, UserIntent};
