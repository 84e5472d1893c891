//! Data types exchanged with the dog adoption search API.
//!
//! Every remote payload is decoded into an explicit schema here, so a missing or
//! mistyped field fails at the boundary instead of surfacing later in the view.

pub mod credentials;
pub mod dog;
pub mod errors;
pub mod location;
pub mod matching;
pub mod search;

pub use credentials::Credentials;
pub use dog::{order_by_ids, Dog, DogId, OrderedBatch};
pub use errors::ModelError;
pub use location::{Location, LocationQuery, LocationSearchResponse};
pub use matching::MatchResponse;
pub use search::{ResultPage, SearchCriteria, SortDirection, PAGE_SIZE, SORT_FIELD};
