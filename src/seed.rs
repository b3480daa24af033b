//! `geo-explorer seed`: bulk-load starter countries, states and cities
//! from a JSON file into the API.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiClient, City, Country, Resource, State};

/// Statuses a bulk create may answer with; 207 is a partial success
const ACCEPTED: [StatusCode; 3] = [StatusCode::OK, StatusCode::CREATED, StatusCode::MULTI_STATUS];

/// Contents of a seed file. Missing collections are empty.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub countries: Vec<Country>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub cities: Vec<City>,
}

impl SeedData {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing seed file {}", path.display()))
    }
}

/// Outcome of one collection's bulk create
#[derive(Debug)]
pub struct Posted {
    pub path: &'static str,
    pub status: StatusCode,
    pub response: Value,
}

/// Post each non-empty collection to its bulk endpoint, countries first.
/// Stops at the first collection the server does not accept.
pub fn seed(api: &ApiClient, data: &SeedData) -> Result<Vec<Posted>> {
    let mut posted = Vec::new();
    posted.extend(post_bulk(api.countries(), &data.countries)?);
    posted.extend(post_bulk(api.states(), &data.states)?);
    posted.extend(post_bulk(api.cities(), &data.cities)?);
    tracing::info!(collections = posted.len(), "seeding finished");
    Ok(posted)
}

fn post_bulk<T: Serialize>(resource: Resource<'_, T>, records: &[T]) -> Result<Option<Posted>> {
    let path = resource.path();
    if records.is_empty() {
        tracing::info!(path, "no records, skipping");
        return Ok(None);
    }

    let (status, response) = resource
        .bulk_create_with_status(records)
        .with_context(|| format!("POST /{path}/bulk"))?;
    if !ACCEPTED.contains(&status) {
        bail!("POST /{path}/bulk answered {status}: {response}");
    }

    tracing::info!(path, records = records.len(), status = status.as_u16(), "bulk created");
    Ok(Some(Posted {
        path,
        status,
        response,
    }))
}
