use ratatui::layout::{Position, Rect};

use crate::controller::MapController;
use crate::forms::{AuthForm, FormKind};
use crate::map::{ShapeLayer, Viewport};
use crate::session::Session;
use crate::worker::{Dispatcher, Job, Outcome};

/// Which full-screen view is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Map,
    Login,
    Register,
}

/// Application state
pub struct App {
    pub controller: MapController,
    pub session: Session,
    pub login: AuthForm,
    pub register: AuthForm,
    pub screen: Screen,
    pub should_quit: bool,
    /// API base URL, shown in the legend
    pub endpoint: String,
    dispatcher: Dispatcher,
    /// Inner map area in terminal coordinates, from the last layout
    map_area: Rect,
    back_button: Option<Rect>,
    /// Projected shapes for the active mode and current map area
    layer: Option<ShapeLayer>,
}

impl App {
    pub fn new(dispatcher: Dispatcher, session: Session, endpoint: String) -> Self {
        Self {
            controller: MapController::new(),
            session,
            login: AuthForm::new(FormKind::Login),
            register: AuthForm::new(FormKind::Register),
            screen: Screen::Map,
            should_quit: false,
            endpoint,
            dispatcher,
            map_area: Rect::default(),
            back_button: None,
            layer: None,
        }
    }

    /// Kick off the initial world data fetches
    pub fn start(&mut self) {
        let fetches = self.controller.mount();
        self.dispatcher.submit_all(fetches);
    }

    /// Apply every background result that has arrived
    pub fn tick(&mut self) {
        for outcome in self.dispatcher.drain() {
            match outcome {
                Outcome::Map(completion) => self.controller.apply(completion),
                Outcome::Auth { kind, result } => {
                    let form = match kind {
                        FormKind::Login => &mut self.login,
                        FormKind::Register => &mut self.register,
                    };
                    form.complete(&self.session, result);
                }
            }
        }
    }

    /// Record the layout of the frame about to be drawn and make sure the
    /// projected layer matches it.
    pub fn sync_layout(&mut self, map_area: Rect, back_button: Option<Rect>) {
        self.map_area = map_area;
        self.back_button = back_button;

        if !self.controller.layer_ready() {
            return;
        }
        let dataset = self.controller.mode().dataset();
        let viewport = Viewport::fit(map_area.width, map_area.height);
        if self.layer.as_ref().is_some_and(|l| l.matches(dataset, &viewport)) {
            return;
        }
        self.layer = Some(ShapeLayer::build(dataset, self.controller.active_shapes(), viewport));
    }

    /// The projected layer, when it is current for the active mode
    pub fn layer(&self) -> Option<&ShapeLayer> {
        let dataset = self.controller.mode().dataset();
        self.layer
            .as_ref()
            .filter(|l| self.controller.layer_ready() && l.dataset() == dataset)
    }

    pub fn map_area(&self) -> Rect {
        self.map_area
    }

    /// Shape under a terminal cell
    fn shape_at(&self, col: u16, row: u16) -> Option<usize> {
        if !self.map_area.contains(Position::new(col, row)) {
            return None;
        }
        self.layer()?
            .owner_at(col - self.map_area.x, row - self.map_area.y)
    }

    // Pointer

    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        if self.screen != Screen::Map {
            return;
        }
        let hit = self.shape_at(col, row);
        self.controller.pointer_at(hit, (col, row));
    }

    pub fn clicked(&mut self, col: u16, row: u16) {
        if self.screen != Screen::Map {
            return;
        }
        if self
            .back_button
            .is_some_and(|button| button.contains(Position::new(col, row)))
        {
            self.back();
            return;
        }
        if let Some(idx) = self.shape_at(col, row) {
            let fetches = self.controller.click(idx);
            self.dispatcher.submit_all(fetches);
        }
    }

    // Map actions

    pub fn back(&mut self) {
        self.controller.back();
    }

    pub fn close_sidebar(&mut self) {
        self.controller.close_sidebar();
    }

    // Screens and forms

    pub fn open(&mut self, screen: Screen) {
        self.controller.pointer_leave();
        self.screen = screen;
    }

    pub fn form_mut(&mut self) -> Option<&mut AuthForm> {
        match self.screen {
            Screen::Map => None,
            Screen::Login => Some(&mut self.login),
            Screen::Register => Some(&mut self.register),
        }
    }

    pub fn form(&self) -> Option<&AuthForm> {
        match self.screen {
            Screen::Map => None,
            Screen::Login => Some(&self.login),
            Screen::Register => Some(&self.register),
        }
    }

    pub fn submit_form(&mut self) {
        if self.session.is_authenticated() {
            return;
        }
        let Some(request) = self.form_mut().and_then(AuthForm::submit) else {
            return;
        };
        self.dispatcher.submit(Job::Auth(request));
    }

    pub fn sign_out(&mut self) {
        if let Err(e) = self.session.sign_out() {
            tracing::warn!(error = %e, "could not remove saved session");
        }
        self.login.reset();
        self.register.reset();
        tracing::info!("signed out");
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
