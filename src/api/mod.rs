//! Client for the geo REST API (countries, states, cities, auth)

mod client;
mod error;
mod types;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{interpret, ApiClient, Resource};
pub use error::{ApiError, ApiResult};
pub use types::{
    City, CitySearch, Country, CountrySearch, Credentials, ListQuery, Registration, SortOrder,
    State, StateSearch, TokenResponse,
};
