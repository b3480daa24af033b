use serde::{Deserialize, Serialize};

/// A country record. `name` is the unique key on the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    /// ISO 3166-1 alpha-2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_code: Option<String>,
}

/// A US state record, keyed by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub state_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
}

/// A city record, scoped to a state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Paging/sorting parameters shared by the list endpoints.
///
/// `code` filters on the resource's code column (`iso_code` for countries,
/// `state_code` for states and cities).
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    pub code: Option<String>,
}

impl ListQuery {
    pub(crate) fn pairs(&self, code_key: &'static str) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        if let Some(code) = &self.code {
            pairs.push((code_key, code.clone()));
        }
        pairs
    }
}

/// `GET /countries/search` filters: substring `name`, exact `iso_code`
#[derive(Clone, Debug, Default)]
pub struct CountrySearch {
    pub name: Option<String>,
    pub iso_code: Option<String>,
}

impl CountrySearch {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([("name", &self.name), ("iso_code", &self.iso_code)])
    }
}

#[derive(Clone, Debug, Default)]
pub struct StateSearch {
    pub name: Option<String>,
    pub state_code: Option<String>,
    pub capital: Option<String>,
}

impl StateSearch {
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([
            ("name", &self.name),
            ("state_code", &self.state_code),
            ("capital", &self.capital),
        ])
    }
}

#[derive(Clone, Debug, Default)]
pub struct CitySearch {
    pub name: Option<String>,
    pub state_code: Option<String>,
}

impl CitySearch {
    /// Search scoped to one state, as the sidebar issues it
    pub fn in_state(state_code: impl Into<String>) -> Self {
        Self {
            name: None,
            state_code: Some(state_code.into()),
        }
    }

    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([("name", &self.name), ("state_code", &self.state_code)])
    }
}

fn collect_pairs<const N: usize>(
    fields: [(&'static str, &Option<String>); N],
) -> Vec<(&'static str, String)> {
    fields
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key, v.clone())))
        .collect()
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Body returned by `/login` and `/register`
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}
