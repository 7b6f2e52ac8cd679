// 🔎 Filter Engine - Which companies are visible right now
// Text query + provider selection, with a transient hover override

use serde::{Deserialize, Serialize};

use crate::catalog::CompanyRecord;
use crate::provider::Provider;

// ============================================================================
// FILTER STATE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring of the company name; empty matches all
    #[serde(default)]
    pub query: String,

    /// Sticky provider filter (pill / chart slice click)
    #[serde(default)]
    pub selected_provider: Option<Provider>,

    /// Transient provider under the pointer; overrides everything else
    #[serde(default)]
    pub hovered_provider: Option<Provider>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn with_selected(mut self, provider: Provider) -> Self {
        self.selected_provider = Some(provider);
        self
    }

    pub fn with_hovered(mut self, provider: Provider) -> Self {
        self.hovered_provider = Some(provider);
        self
    }

    /// Clicking the selected provider again clears the selection
    pub fn toggle_provider(&mut self, provider: Provider) {
        if self.selected_provider == Some(provider) {
            self.selected_provider = None;
        } else {
            self.selected_provider = Some(provider);
        }
    }

    /// The provider that currently narrows the view, hover first
    pub fn focused_provider(&self) -> Option<Provider> {
        self.hovered_provider.or(self.selected_provider)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.query.is_empty() && self.selected_provider.is_none() && self.hovered_provider.is_none()
    }

    /// Does a single record pass this state?
    pub fn matches(&self, record: &CompanyRecord) -> bool {
        if let Some(hovered) = self.hovered_provider {
            return record.provider == hovered;
        }

        let matches_search = self.query.is_empty()
            || record
                .name
                .to_lowercase()
                .contains(&self.query.to_lowercase());
        let matches_provider = self
            .selected_provider
            .map_or(true, |selected| record.provider == selected);

        matches_search && matches_provider
    }
}

/// Visible subset of `records`, in catalog order
pub fn visible<'a, I>(records: I, state: &FilterState) -> Vec<&'a CompanyRecord>
where
    I: IntoIterator<Item = &'a CompanyRecord>,
{
    records.into_iter().filter(|r| state.matches(r)).collect()
}
