use serde::{Deserialize, Serialize};

/// A searchable location keyed by zip code. Only `zip_code` and `city` are shown;
/// the geographic fields are kept when the API supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub zip_code: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    /// Label used by selection lists, e.g. `Boston (02110)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.city, self.zip_code)
    }
}

/// Body of `POST locations/search`. The UI sends an empty filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocationQuery {}

/// Response of `POST locations/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationSearchResponse {
    pub results: Vec<Location>,
    #[serde(default)]
    pub total: Option<u64>,
}
