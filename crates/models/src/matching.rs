use serde::Deserialize;

use crate::dog::DogId;

/// Response of `POST dogs/match`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub matched: DogId,
}
