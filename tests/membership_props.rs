//! Property tests for the membership indices and the city list.
//!
//! 1. Index builders never panic, whatever JSON the API returns
//! 2. The country total counts every non-null entry
//! 3. Only entries with a non-empty `iso_code` are marked present
//! 4. City names come back sorted, one per key
//! 5. Every non-null state entry is present; only null entries are dropped

use geo_explorer::membership::{city_names, CountryIndex, StateIndex};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ── Strategies ──────────────────────────────────────────────────────────

/// Arbitrary JSON, a few levels deep
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// One `countries` entry: null, a record with or without a code, or junk
fn country_entry() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        ("[A-Z]{2}", "[A-Za-z ]{1,10}").prop_map(|(code, name)| json!({"iso_code": code, "name": name})),
        "[A-Za-z ]{1,10}".prop_map(|name| json!({"name": name})),
        Just(json!({"iso_code": ""})),
        any::<i64>().prop_map(Value::from),
    ]
}

fn countries_body() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[A-Za-z]{1,8}", country_entry(), 0..20)
        .prop_map(|m| m.into_iter().collect())
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn builders_accept_any_json(body in json_strategy()) {
        let countries = CountryIndex::from_response(&body);
        let states = StateIndex::from_response(&body);
        let cities = city_names(&body);
        prop_assert!(countries.codes().len() <= countries.total());
        prop_assert!(states.total() <= 6);
        prop_assert!(cities.len() <= 6);

        let wrapped = json!({"countries": body.clone(), "states": body.clone(), "cities": body});
        let _ = CountryIndex::from_response(&wrapped);
        let _ = StateIndex::from_response(&wrapped);
        let _ = city_names(&wrapped);
    }

    #[test]
    fn country_total_counts_non_null_entries(entries in countries_body()) {
        let non_null = entries.values().filter(|v| !v.is_null()).count();
        let index = CountryIndex::from_response(&json!({"countries": Value::Object(entries.clone())}));
        prop_assert_eq!(index.total(), non_null);

        for entry in entries.values() {
            match entry.get("iso_code").and_then(Value::as_str) {
                Some(code) if !code.is_empty() => prop_assert!(index.contains(code)),
                _ => {}
            }
        }
        for code in index.codes() {
            prop_assert!(index.display_name(code).is_some());
        }
    }

    #[test]
    fn city_names_sorted_and_complete(keys in prop::collection::btree_set("[A-Za-z ]{1,12}", 0..30)) {
        let cities: Map<String, Value> = keys.iter().map(|k| (k.clone(), json!({}))).collect();
        let names = city_names(&json!({"cities": Value::Object(cities)}));
        prop_assert_eq!(names.len(), keys.len());
        prop_assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn states_keep_every_non_null_entry(
        records in prop::collection::btree_map("[A-Z][a-z]{2,8}", ("[A-Z]{2}", "[A-Z][a-z]{2,8}"), 0..10),
        scalars in prop::collection::btree_map("[a-z]{3,8}", prop_oneof![
            "[A-Z]{0,2}".prop_map(Value::String),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::Bool),
        ], 0..5),
        nulls in prop::collection::btree_set("[0-9]{3,6}", 0..5),
    ) {
        let mut states: Map<String, Value> = records
            .iter()
            .map(|(name, (code, capital))| (name.clone(), json!({"state_code": code, "capital": capital})))
            .collect();
        for (name, value) in &scalars {
            states.insert(name.clone(), value.clone());
        }
        for name in &nulls {
            states.insert(name.clone(), Value::Null);
        }

        let index = StateIndex::from_response(&json!({"states": Value::Object(states)}));
        prop_assert_eq!(index.total(), records.len() + scalars.len());
        for (name, (code, capital)) in &records {
            prop_assert_eq!(index.code(name), Some(code.as_str()));
            prop_assert_eq!(index.capital(name), Some(capital.as_str()));
        }
        for name in scalars.keys() {
            prop_assert!(index.contains(name));
            prop_assert_eq!(index.code(name), None);
            prop_assert_eq!(index.capital(name), Some(""));
        }
        for name in &nulls {
            prop_assert!(!index.contains(name));
        }
    }
}
