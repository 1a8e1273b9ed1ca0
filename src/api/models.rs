use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl SummaryRequest {
    pub fn new(url: impl Into<String>) -> Self {
        SummaryRequest { url: Some(url.into()) }
    }

    /// The requested URL, if one was given and it is not blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
