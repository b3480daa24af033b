//! Lookup indices built from API list responses.
//!
//! Each index is rebuilt from scratch from one response body; there is no
//! incremental patching. Missing or malformed payloads produce empty
//! indices rather than errors.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

/// Countries present in the database, keyed by ISO alpha-2 code
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountryIndex {
    codes: HashSet<String>,
    names: HashMap<String, String>,
    total: usize,
}

impl CountryIndex {
    /// Build from a `GET /countries` body: `{"countries": {key: {name, iso_code}}}`
    pub fn from_response(body: &Value) -> Self {
        let mut index = Self::default();
        let Some(entries) = body.get("countries").and_then(Value::as_object) else {
            return index;
        };

        for (key, entry) in entries {
            if entry.is_null() {
                continue;
            }
            index.total += 1;

            let Some(code) = entry.get("iso_code").and_then(Value::as_str) else {
                continue;
            };
            if code.is_empty() {
                continue;
            }
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(key.as_str());
            index.codes.insert(code.to_string());
            index.names.insert(code.to_string(), name.to_string());
        }
        index
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Non-null entries in the response, with or without a code
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn codes(&self) -> &HashSet<String> {
        &self.codes
    }
}

/// States present in the database, keyed by state name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateIndex {
    names: HashSet<String>,
    codes: HashMap<String, String>,
    capitals: HashMap<String, String>,
}

impl StateIndex {
    /// Build from a `GET /states` body: `{"states": {name: {state_code, capital}}}`
    pub fn from_response(body: &Value) -> Self {
        let mut index = Self::default();
        let Some(entries) = body.get("states").and_then(Value::as_object) else {
            return index;
        };

        for (name, entry) in entries {
            if entry.is_null() {
                continue;
            }
            index.names.insert(name.clone());
            // A blank code cannot scope a city search
            if let Some(code) = entry
                .get("state_code")
                .and_then(Value::as_str)
                .filter(|code| !code.is_empty())
            {
                index.codes.insert(name.clone(), code.to_string());
            }
            let capital = entry.get("capital").and_then(Value::as_str).unwrap_or("");
            index.capitals.insert(name.clone(), capital.to_string());
        }
        index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn code(&self, name: &str) -> Option<&str> {
        self.codes.get(name).map(String::as_str)
    }

    /// Capital for a state in the index; empty when the record has none
    pub fn capital(&self, name: &str) -> Option<&str> {
        self.capitals.get(name).map(String::as_str)
    }

    pub fn total(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &HashSet<String> {
        &self.names
    }
}

/// City names from a `GET /cities/search` body, sorted
pub fn city_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body
        .get("cities")
        .and_then(Value::as_object)
        .map(|cities| cities.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_country_index_from_response() {
        let index = CountryIndex::from_response(&json!({
            "countries": {
                "Japan": {"name": "Japan", "iso_code": "JP"},
                "Atlantis": {"name": "Atlantis"},
                "Ghost": null
            }
        }));
        assert!(index.contains("JP"));
        assert_eq!(index.codes().len(), 1);
        assert_eq!(index.display_name("JP"), Some("Japan"));
        assert_eq!(index.total(), 2);
    }

    #[test]
    fn test_malformed_payloads_are_empty() {
        for body in [json!(null), json!({}), json!({"countries": []}), json!("oops")] {
            assert_eq!(CountryIndex::from_response(&body), CountryIndex::default());
            assert_eq!(StateIndex::from_response(&body), StateIndex::default());
            assert!(city_names(&body).is_empty());
        }
    }

    #[test]
    fn test_state_index_maps() {
        let index = StateIndex::from_response(&json!({
            "states": {
                "California": {"state_code": "CA", "capital": "Sacramento"},
                "Texas": {"state_code": "TX"},
                "Ohio": "OH",
                "Nevada": {"state_code": "", "capital": "Carson City"},
                "Ghost": null
            }
        }));
        assert_eq!(index.total(), 4);
        assert_eq!(index.code("California"), Some("CA"));
        assert_eq!(index.capital("California"), Some("Sacramento"));
        assert_eq!(index.capital("Texas"), Some(""));
        // Non-object records still count as present, just without details
        assert!(index.contains("Ohio"));
        assert_eq!(index.code("Ohio"), None);
        assert_eq!(index.capital("Ohio"), Some(""));
        assert!(index.contains("Nevada"));
        assert_eq!(index.code("Nevada"), None);
        assert!(!index.contains("Ghost"));
    }

    #[test]
    fn test_city_names_sorted() {
        let names = city_names(&json!({"cities": {"San Jose": {}, "Fresno": {}}}));
        assert_eq!(names, vec!["Fresno", "San Jose"]);
    }
}
