//! Map view controller.
//!
//! Owns the view mode (world or US), hover and selection state, the loaded
//! boundary sets and membership indices. It never performs I/O: operations
//! that need data return [`Fetch`] requests, and results come back through
//! [`MapController::apply`]. All mutation happens on the UI thread.

use serde_json::Value;

use crate::data::{BoundaryShape, Dataset};
use crate::geo::{self, US_ALPHA2};
use crate::membership::{city_names, CountryIndex, StateIndex};
use crate::surface::{self, Fill};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    World,
    Us,
}

impl ViewMode {
    pub fn dataset(self) -> Dataset {
        match self {
            ViewMode::World => Dataset::World,
            ViewMode::Us => Dataset::UsStates,
        }
    }
}

/// The state whose cities fill the sidebar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedState {
    pub name: String,
    pub code: String,
    pub capital: String,
}

/// Floating label under the pointer. `position` is the pointer's terminal cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tooltip {
    pub visible: bool,
    pub text: String,
    pub position: (u16, u16),
}

/// Progress of one kind of fetch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Not yet fetched, or the last attempt failed
    fn needs_fetch(&self) -> bool {
        matches!(self, LoadStatus::Idle | LoadStatus::Failed(_))
    }
}

/// Data the controller asks the dispatcher to fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetch {
    Boundaries(Dataset),
    Countries,
    States,
    /// City search for one state; `token` identifies the request
    Cities { token: u64, state_code: String },
}

/// Result of a [`Fetch`], errors already rendered to text
#[derive(Debug)]
pub enum Completion {
    Boundaries {
        dataset: Dataset,
        result: Result<Vec<BoundaryShape>, String>,
    },
    Countries(Result<Value, String>),
    States(Result<Value, String>),
    Cities {
        token: u64,
        result: Result<Value, String>,
    },
}

#[derive(Debug, Default)]
pub struct MapController {
    mode: ViewMode,
    hovered: Option<usize>,
    selected: Option<SelectedState>,
    tooltip: Tooltip,

    world: Vec<BoundaryShape>,
    world_status: LoadStatus,
    us: Vec<BoundaryShape>,
    us_status: LoadStatus,

    countries: CountryIndex,
    countries_status: LoadStatus,
    states: StateIndex,
    states_status: LoadStatus,

    cities: Vec<String>,
    cities_status: LoadStatus,
    /// Token of the newest city search; older responses are dropped
    city_token: u64,
}

impl MapController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the world view: boundaries and country membership load eagerly.
    pub fn mount(&mut self) -> Vec<Fetch> {
        let mut fetches = Vec::new();
        if self.world_status.needs_fetch() {
            self.world_status = LoadStatus::Loading;
            fetches.push(Fetch::Boundaries(Dataset::World));
        }
        if self.countries_status.needs_fetch() {
            self.countries_status = LoadStatus::Loading;
            fetches.push(Fetch::Countries);
        }
        fetches
    }

    // Accessors

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<&SelectedState> {
        self.selected.as_ref()
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn countries(&self) -> &CountryIndex {
        &self.countries
    }

    pub fn states(&self) -> &StateIndex {
        &self.states
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn cities_status(&self) -> &LoadStatus {
        &self.cities_status
    }

    pub fn countries_status(&self) -> &LoadStatus {
        &self.countries_status
    }

    pub fn states_status(&self) -> &LoadStatus {
        &self.states_status
    }

    pub fn boundary_status(&self, dataset: Dataset) -> &LoadStatus {
        match dataset {
            Dataset::World => &self.world_status,
            Dataset::UsStates => &self.us_status,
        }
    }

    /// Boundary shapes of the active mode (empty until loaded)
    pub fn active_shapes(&self) -> &[BoundaryShape] {
        match self.mode {
            ViewMode::World => &self.world,
            ViewMode::Us => &self.us,
        }
    }

    fn membership_status(&self) -> &LoadStatus {
        match self.mode {
            ViewMode::World => &self.countries_status,
            ViewMode::Us => &self.states_status,
        }
    }

    /// Whether the active layer can be drawn: shapes are loaded and the
    /// membership index has settled (loaded or failed).
    pub fn layer_ready(&self) -> bool {
        self.boundary_status(self.mode.dataset()).is_loaded() && !self.membership_status().is_loading()
    }

    /// Loading indicator text for the active mode, if anything is pending
    pub fn loading_label(&self) -> Option<&'static str> {
        match self.mode {
            ViewMode::World if self.world_status.is_loading() => Some("Loading world map…"),
            ViewMode::World if self.countries_status.is_loading() => Some("Loading countries…"),
            ViewMode::Us if self.us_status.is_loading() => Some("Loading US map…"),
            ViewMode::Us if self.states_status.is_loading() => Some("Loading states…"),
            _ => None,
        }
    }

    /// Error banners for the active mode
    pub fn banners(&self) -> Vec<String> {
        let (boundaries, membership, what) = match self.mode {
            ViewMode::World => (&self.world_status, &self.countries_status, "countries"),
            ViewMode::Us => (&self.us_status, &self.states_status, "states"),
        };
        let mut banners = Vec::new();
        if let Some(e) = boundaries.error() {
            banners.push(format!("Could not load {}: {e}", self.mode.dataset().label()));
        }
        if let Some(e) = membership.error() {
            banners.push(format!("Could not load {what}: {e}"));
        }
        banners
    }

    /// Sidebar is shown only for a selected state in the US view
    pub fn sidebar_visible(&self) -> bool {
        self.mode == ViewMode::Us && self.selected.is_some()
    }

    // Derived per-shape values

    /// Whether the shape's entity exists in the database
    pub fn is_present(&self, idx: usize) -> bool {
        let Some(shape) = self.active_shapes().get(idx) else {
            return false;
        };
        match self.mode {
            ViewMode::World => geo::alpha2_for_feature_id(&shape.id)
                .map(|code| self.countries.contains(code))
                .unwrap_or(false),
            ViewMode::Us => self.states.contains(&shape.name),
        }
    }

    /// The United States shape in the world view
    pub fn is_drill_target(&self, idx: usize) -> bool {
        self.mode == ViewMode::World
            && self
                .active_shapes()
                .get(idx)
                .is_some_and(|shape| geo::is_united_states(&shape.id))
    }

    pub fn shape_fill(&self, idx: usize) -> Fill {
        surface::classify(
            self.mode,
            self.is_present(idx),
            self.is_drill_target(idx),
            self.hovered == Some(idx),
        )
    }

    /// Tooltip label for a shape of the active layer
    pub fn label(&self, idx: usize) -> Option<String> {
        let shape = self.active_shapes().get(idx)?;
        let text = match self.mode {
            ViewMode::World => match geo::alpha2_for_feature_id(&shape.id) {
                Some(US_ALPHA2) => format!(
                    "{} — click to explore states",
                    self.countries.display_name(US_ALPHA2).unwrap_or(&shape.name)
                ),
                Some(code) if self.countries.contains(code) => {
                    self.countries.display_name(code).unwrap_or(code).to_string()
                }
                _ => format!("{} (not in DB)", shape.name),
            },
            ViewMode::Us if self.states.contains(&shape.name) => {
                match self.states.capital(&shape.name).filter(|c| !c.is_empty()) {
                    Some(capital) => format!("{} · Capital: {capital}", shape.name),
                    None => shape.name.clone(),
                }
            }
            ViewMode::Us => format!("{} (not in DB)", shape.name),
        };
        Some(text)
    }

    // Pointer events

    /// Feed the shape under the pointer (from hit-testing) and translate it
    /// into enter / move / leave.
    pub fn pointer_at(&mut self, hit: Option<usize>, position: (u16, u16)) {
        match (self.hovered, hit) {
            (Some(current), Some(idx)) if current == idx => self.pointer_move(position),
            (_, Some(idx)) => self.pointer_enter(idx, position),
            (Some(_), None) => self.pointer_leave(),
            (None, None) => {}
        }
    }

    pub fn pointer_enter(&mut self, idx: usize, position: (u16, u16)) {
        let Some(text) = self.label(idx) else {
            self.pointer_leave();
            return;
        };
        self.hovered = Some(idx);
        self.tooltip = Tooltip {
            visible: true,
            text,
            position,
        };
    }

    pub fn pointer_move(&mut self, position: (u16, u16)) {
        if self.tooltip.visible {
            self.tooltip.position = position;
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = None;
        self.tooltip = Tooltip::default();
    }

    // Actions

    /// Click on a shape of the active layer
    pub fn click(&mut self, idx: usize) -> Vec<Fetch> {
        match self.mode {
            ViewMode::World => {
                if !self.is_drill_target(idx) {
                    return Vec::new();
                }
                self.drill_down()
            }
            ViewMode::Us => self.select_state(idx).into_iter().collect(),
        }
    }

    fn drill_down(&mut self) -> Vec<Fetch> {
        self.mode = ViewMode::Us;
        self.pointer_leave();

        let mut fetches = Vec::new();
        if self.us_status.needs_fetch() {
            self.us_status = LoadStatus::Loading;
            fetches.push(Fetch::Boundaries(Dataset::UsStates));
        }
        if self.states_status.needs_fetch() {
            self.states_status = LoadStatus::Loading;
            fetches.push(Fetch::States);
        }
        tracing::info!(fetches = fetches.len(), "drilled into US view");
        fetches
    }

    fn select_state(&mut self, idx: usize) -> Option<Fetch> {
        let name = self.us.get(idx)?.name.clone();
        if !self.states.contains(&name) {
            return None;
        }
        let Some(code) = self.states.code(&name).map(str::to_owned) else {
            tracing::warn!(state = %name, "state has no state_code, cannot search cities");
            return None;
        };

        let capital = self.states.capital(&name).unwrap_or_default().to_string();
        self.selected = Some(SelectedState {
            name,
            code: code.clone(),
            capital,
        });
        self.cities.clear();
        self.city_token += 1;
        self.cities_status = LoadStatus::Loading;

        tracing::info!(state_code = %code, token = self.city_token, "selected state");
        Some(Fetch::Cities {
            token: self.city_token,
            state_code: code,
        })
    }

    /// Return to the world view. No-op in the world view.
    pub fn back(&mut self) -> bool {
        if self.mode != ViewMode::Us {
            return false;
        }
        self.mode = ViewMode::World;
        self.pointer_leave();
        self.clear_selection();
        tracing::info!("returned to world view");
        true
    }

    /// Dismiss the cities sidebar
    pub fn close_sidebar(&mut self) -> bool {
        if self.selected.is_none() {
            return false;
        }
        self.clear_selection();
        true
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.cities.clear();
        self.cities_status = LoadStatus::Idle;
        // Invalidate any search still in flight
        self.city_token += 1;
    }

    /// Apply a finished fetch
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Boundaries { dataset, result } => {
                let (shapes, status) = match dataset {
                    Dataset::World => (&mut self.world, &mut self.world_status),
                    Dataset::UsStates => (&mut self.us, &mut self.us_status),
                };
                match result {
                    Ok(loaded) => {
                        *shapes = loaded;
                        *status = LoadStatus::Loaded;
                    }
                    Err(e) => *status = LoadStatus::Failed(e),
                }
            }
            Completion::Countries(result) => match result {
                Ok(body) => {
                    self.countries = CountryIndex::from_response(&body);
                    self.countries_status = LoadStatus::Loaded;
                }
                Err(e) => self.countries_status = LoadStatus::Failed(e),
            },
            Completion::States(result) => match result {
                Ok(body) => {
                    self.states = StateIndex::from_response(&body);
                    self.states_status = LoadStatus::Loaded;
                }
                Err(e) => self.states_status = LoadStatus::Failed(e),
            },
            Completion::Cities { token, result } => {
                if token != self.city_token {
                    tracing::debug!(token, current = self.city_token, "discarding stale city search");
                    return;
                }
                match result {
                    Ok(body) => {
                        self.cities = city_names(&body);
                        self.cities_status = LoadStatus::Loaded;
                    }
                    Err(e) => self.cities_status = LoadStatus::Failed(e),
                }
            }
        }
        self.refresh_tooltip();
    }

    /// Membership may have changed under a hovered shape
    fn refresh_tooltip(&mut self) {
        if let Some(idx) = self.hovered {
            match self.label(idx) {
                Some(text) => self.tooltip.text = text,
                None => self.pointer_leave(),
            }
        }
    }
}
