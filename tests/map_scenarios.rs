//! End-to-end scenarios across the loader, controller, layer and forms.

use geo_explorer::api::{interpret, TokenResponse};
use geo_explorer::controller::{Completion, Fetch, MapController, ViewMode};
use geo_explorer::data::{Dataset, ReferenceLoader, ReferenceSource};
use geo_explorer::forms::{AuthForm, FormKind, FormStatus};
use geo_explorer::map::{Projection, ShapeLayer, Viewport};
use geo_explorer::session::Session;
use geo_explorer::surface::{self, Tone};
use reqwest::StatusCode;
use serde_json::json;

/// Quantized world topology with Japan (392), the US (840) and France (250)
const WORLD: &str = r#"{
    "type": "Topology",
    "transform": {"scale": [1, 1], "translate": [0, 0]},
    "arcs": [
        [[130, 31], [11, 0], [0, 14], [-11, 0], [0, -14]],
        [[-125, 25], [59, 0], [0, 24], [-59, 0], [0, -24]],
        [[-4, 43], [12, 0], [0, 8], [-12, 0], [0, -8]]
    ],
    "objects": {"countries": {"type": "GeometryCollection", "geometries": [
        {"type": "Polygon", "id": "392", "properties": {"name": "Japan"}, "arcs": [[0]]},
        {"type": "Polygon", "id": "840", "properties": {"name": "United States of America"}, "arcs": [[1]]},
        {"type": "Polygon", "id": "250", "properties": {"name": "France"}, "arcs": [[2]]}
    ]}}
}"#;

fn world_controller(countries: serde_json::Value) -> MapController {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("countries-110m.json");
    std::fs::write(&path, WORLD).unwrap();
    let shapes = ReferenceLoader::new(None)
        .unwrap()
        .load(&ReferenceSource {
            dataset: Dataset::World,
            location: path.display().to_string(),
        })
        .unwrap();

    let mut controller = MapController::new();
    assert_eq!(controller.mount().len(), 2);
    controller.apply(Completion::Boundaries {
        dataset: Dataset::World,
        result: Ok(shapes),
    });
    controller.apply(Completion::Countries(Ok(countries)));
    controller
}

fn owner_of(layer: &ShapeLayer, lon: f64, lat: f64) -> Option<usize> {
    let p = layer
        .viewport()
        .to_pixel(Projection::for_dataset(Dataset::World).project(lon, lat).unwrap());
    layer.owner_at((p.x / 2.0) as u16, (p.y / 4.0) as u16)
}

fn us_controller() -> MapController {
    let mut controller = world_controller(json!({"countries": {}}));
    let fetches = controller.click(1);
    assert_eq!(fetches, vec![Fetch::Boundaries(Dataset::UsStates), Fetch::States]);
    controller.apply(Completion::Boundaries {
        dataset: Dataset::UsStates,
        result: Ok(vec![
            state_shape("06", "California"),
            state_shape("48", "Texas"),
        ]),
    });
    controller.apply(Completion::States(Ok(json!({"states": {
        "California": {"state_code": "CA", "capital": "Sacramento"},
        "Texas": {"state_code": "TX", "capital": "Austin"}
    }}))));
    controller
}

fn state_shape(id: &str, name: &str) -> geo_explorer::data::BoundaryShape {
    geo_explorer::data::BoundaryShape {
        id: id.into(),
        name: name.into(),
        rings: Vec::new(),
    }
}

fn city_token(fetches: &[Fetch]) -> u64 {
    match fetches {
        [Fetch::Cities { token, .. }] => *token,
        other => panic!("expected a single city search, got {other:?}"),
    }
}

#[test]
fn japan_renders_in_present_colour() {
    let controller = world_controller(json!({"countries": {"Japan": {"name": "Japan", "iso_code": "JP"}}}));
    assert!(controller.layer_ready());
    assert_eq!(controller.countries().total(), 1);

    let layer = ShapeLayer::build(Dataset::World, controller.active_shapes(), Viewport::fit(160, 50));
    let japan = owner_of(&layer, 136.0, 38.0).expect("Japan covers its centre cell");
    assert_eq!(controller.active_shapes()[japan].name, "Japan");

    let fill = controller.shape_fill(japan);
    assert_eq!(fill.tone, Tone::Present);
    assert_eq!(surface::color(ViewMode::World, fill), ratatui::style::Color::Rgb(0x24, 0x78, 0xA0));

    let france = owner_of(&layer, 2.0, 47.0).expect("France covers its centre cell");
    assert_eq!(controller.shape_fill(france).tone, Tone::Absent);
    let usa = owner_of(&layer, -100.0, 38.0).expect("US covers its centre cell");
    assert_eq!(controller.shape_fill(usa).tone, Tone::Invite);
}

#[test]
fn drilling_twice_issues_no_duplicate_fetches() {
    let mut controller = world_controller(json!({"countries": {}}));
    assert_eq!(
        controller.click(1),
        vec![Fetch::Boundaries(Dataset::UsStates), Fetch::States]
    );
    assert!(controller.back());
    assert!(controller.click(1).is_empty());
    assert_eq!(controller.mode(), ViewMode::Us);
}

#[test]
fn back_clears_selection_and_keeps_world_data() {
    let mut controller = us_controller();
    let token = city_token(&controller.click(0));
    controller.apply(Completion::Cities {
        token,
        result: Ok(json!({"cities": {"San Jose": {}, "Fresno": {}}})),
    });
    assert_eq!(controller.cities(), ["Fresno", "San Jose"]);

    assert!(controller.back());
    assert_eq!(controller.mode(), ViewMode::World);
    assert!(controller.selected().is_none());
    assert!(controller.cities().is_empty());
    assert!(controller.mount().is_empty());
    assert!(controller.layer_ready());
}

#[test]
fn slower_older_city_response_is_discarded() {
    let mut controller = us_controller();
    let california = city_token(&controller.click(0));
    let texas = city_token(&controller.click(1));

    // Texas answers first, California's late answer must not replace it
    controller.apply(Completion::Cities {
        token: texas,
        result: Ok(json!({"cities": {"Houston": {}, "Austin": {}}})),
    });
    controller.apply(Completion::Cities {
        token: california,
        result: Ok(json!({"cities": {"Fresno": {}}})),
    });

    let selected = controller.selected().unwrap();
    assert_eq!(selected.name, "Texas");
    assert_eq!(selected.capital, "Austin");
    assert_eq!(controller.cities(), ["Austin", "Houston"]);
}

#[test]
fn rejected_login_shows_server_message_and_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open(dir.path().join("token"));

    let mut form = AuthForm::new(FormKind::Login);
    "ada@example.com".chars().for_each(|c| form.input(c));
    form.focus_next();
    "wrong".chars().for_each(|c| form.input(c));
    assert!(form.submit().is_some());

    let result = interpret(StatusCode::UNAUTHORIZED, br#"{"message": "Invalid credentials"}"#)
        .and_then(|v| Ok(serde_json::from_value::<TokenResponse>(v)?))
        .map_err(|e| e.to_string());
    form.complete(&session, result);

    assert_eq!(form.status(), &FormStatus::Failed("Invalid credentials".into()));
    assert!(!session.is_authenticated());
    assert!(!dir.path().join("token").exists());
}

#[test]
fn accepted_login_persists_token_for_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("token");
    let session = Session::open(&path);

    let mut form = AuthForm::new(FormKind::Login);
    "ada@example.com".chars().for_each(|c| form.input(c));
    form.focus_next();
    "secret".chars().for_each(|c| form.input(c));
    form.submit();

    let body = interpret(StatusCode::OK, br#"{"token": "t-123"}"#).unwrap();
    form.complete(&session, Ok(serde_json::from_value(body).unwrap()));

    assert_eq!(form.status(), &FormStatus::Succeeded("Login successful!"));
    assert_eq!(Session::open(&path).token().as_deref(), Some("t-123"));
}
