//! Terminal map explorer for a geographic REST API.
//!
//! The world view colours each country by whether it exists in the
//! database; clicking the United States drills into a states view, and
//! clicking a state lists its cities. Boundary data is TopoJSON drawn on a
//! Braille canvas.

pub mod api;
pub mod app;
pub mod braille;
pub mod config;
pub mod controller;
pub mod data;
pub mod forms;
pub mod geo;
pub mod logging;
pub mod map;
pub mod membership;
pub mod seed;
pub mod session;
pub mod surface;
pub mod ui;
pub mod worker;
