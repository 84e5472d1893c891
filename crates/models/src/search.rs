use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dog::DogId;
use crate::errors::ModelError;

/// Results per page. Fixed by the UI.
pub const PAGE_SIZE: u32 = 10;
/// The only sortable field the UI exposes.
pub const SORT_FIELD: &str = "breed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(ModelError::Validation(format!("unknown sort direction '{other}'"))),
        }
    }
}

/// Filter, sort and page state that drives `GET dogs/search`.
///
/// Transitions return a new value; the orchestrator swaps it in whole so every
/// outstanding request can be compared against the snapshot that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCriteria {
    pub breed: Option<String>,
    pub zip_code: Option<String>,
    /// `None` until the user explicitly picks a direction; the server default applies.
    pub sort: Option<SortDirection>,
    /// 1-based.
    pub page: u32,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self { breed: None, zip_code: None, sort: None, page: 1 }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl SearchCriteria {
    /// Set or clear the breed facet. Resets to page 1.
    pub fn with_breed(&self, breed: Option<String>) -> Self {
        Self { breed: non_blank(breed), page: 1, ..self.clone() }
    }

    /// Set or clear the location facet. Resets to page 1.
    pub fn with_zip_code(&self, zip_code: Option<String>) -> Self {
        Self { zip_code: non_blank(zip_code), page: 1, ..self.clone() }
    }

    /// Choose a sort direction; filters and page are kept.
    pub fn with_sort(&self, sort: SortDirection) -> Self {
        Self { sort: Some(sort), ..self.clone() }
    }

    /// Move to `page`; filters and sort are kept.
    pub fn with_page(&self, page: u32) -> Result<Self, ModelError> {
        if page == 0 {
            return Err(ModelError::Validation("page numbers start at 1".into()));
        }
        Ok(Self { page, ..self.clone() })
    }

    /// Zero-based result offset for the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(PAGE_SIZE)
    }

    /// Query pairs for `GET dogs/search`, in the order they are sent.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("from", self.offset().to_string()), ("size", PAGE_SIZE.to_string())];
        if let Some(breed) = &self.breed {
            pairs.push(("breed", json_array(breed)));
        }
        if let Some(zip) = &self.zip_code {
            pairs.push(("zipCodes", json_array(zip)));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", format!("{SORT_FIELD}:{sort}")));
        }
        pairs
    }
}

fn json_array(value: &str) -> String {
    serde_json::to_string(&[value]).unwrap_or_else(|_| format!("[\"{value}\"]"))
}

/// Response of `GET dogs/search`. `result_ids` order is the display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub result_ids: Vec<DogId>,
    pub total: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}
