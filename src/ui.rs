use crate::app::{App, Screen};
use crate::controller::{LoadStatus, MapController, SelectedState, ViewMode};
use crate::forms::{AuthForm, Field, FormStatus};
use crate::map::ShapeLayer;
use crate::surface::{self, Fill, Tone};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 34;
const BACK_LABEL: &str = " ← World Map ";

const INK: Color = Color::Rgb(0x0B, 0x33, 0x45);
const MUTED: Color = Color::DarkGray;
const ERROR: Color = Color::Rgb(0xD9, 0x5A, 0x4A);
const SUCCESS: Color = Color::Rgb(0x3D, 0x7A, 0x50);

/// Screen areas for one frame
#[derive(Clone, Copy, Debug)]
pub struct Regions {
    pub header: Rect,
    pub back_button: Option<Rect>,
    pub map: Rect,
    pub map_inner: Rect,
    pub sidebar: Option<Rect>,
    /// Bottom row of the map, when a selection is shown but the sidebar does not fit
    pub selection_note: Option<Rect>,
    pub legend: Rect,
    pub status: Rect,
}

/// Split the terminal into header, map (plus sidebar), legend and status bar
pub fn regions(area: Rect, app: &App) -> Regions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Legend
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let header = chunks[0];
    let back_button = (app.controller.mode() == ViewMode::Us).then(|| {
        let width = Line::from(BACK_LABEL).width() as u16;
        Rect::new(
            header.x + header.width.saturating_sub(width + 1),
            header.y,
            width.min(header.width),
            1,
        )
    });

    let (map, sidebar, selection_note) = split_body(chunks[1], app.controller.sidebar_visible());

    Regions {
        header,
        back_button,
        map,
        map_inner: map_block(app.controller.mode()).inner(map),
        sidebar,
        selection_note,
        legend: chunks[2],
        status: chunks[3],
    }
}

/// Map beside the sidebar when both fit. Otherwise the map keeps the full
/// width and a visible sidebar shrinks to a note on the map's bottom row.
fn split_body(body: Rect, sidebar_visible: bool) -> (Rect, Option<Rect>, Option<Rect>) {
    if !sidebar_visible {
        return (body, None, None);
    }
    if body.width > SIDEBAR_WIDTH * 2 {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(SIDEBAR_WIDTH)])
            .split(body);
        return (split[0], Some(split[1]), None);
    }
    let note = Rect::new(body.x, body.bottom().saturating_sub(1), body.width, body.height.min(1));
    (body, None, Some(note))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let regions = regions(frame.area(), app);

    render_header(frame, app, &regions);
    render_map(frame, app, &regions);
    if let Some(sidebar) = regions.sidebar {
        render_sidebar(frame, &app.controller, sidebar);
    }
    if let (Some(area), Some(state)) = (regions.selection_note, app.controller.selected()) {
        let controller = &app.controller;
        let note = selection_note(state, controller.cities_status(), controller.cities().len());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(Span::styled(note, Style::default().fg(INK).add_modifier(Modifier::BOLD))),
            area,
        );
    }
    render_legend(frame, app, regions.legend);
    render_status_bar(frame, app, regions.status);

    if let Some(form) = app.form() {
        render_form(frame, app, form, regions.map);
    }
}

fn map_block(mode: ViewMode) -> Block<'static> {
    let title = match mode {
        ViewMode::World => " World ",
        ViewMode::Us => " States ",
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_header(frame: &mut Frame, app: &App, regions: &Regions) {
    let (title, subtitle) = match app.controller.mode() {
        ViewMode::World => (
            "Geographic Explorer",
            "Countries highlighted in blue exist in the database. Click the USA to explore states.",
        ),
        ViewMode::Us => (
            "United States",
            "Green states exist in the database. Click any green state to see its cities.",
        ),
    };
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!(" {title}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!(" {subtitle}"), Style::default().fg(MUTED))),
    ]);
    frame.render_widget(header, regions.header);

    if let Some(button) = regions.back_button {
        frame.render_widget(
            Paragraph::new(Span::styled(
                BACK_LABEL,
                Style::default()
                    .fg(Color::Rgb(0xFF, 0xFF, 0xFF))
                    .bg(Color::Rgb(0x8B, 0x5E, 0x34))
                    .add_modifier(Modifier::BOLD),
            )),
            button,
        );
    }
}

fn render_map(frame: &mut Frame, app: &App, regions: &Regions) {
    let block = map_block(app.controller.mode());
    let inner = regions.map_inner;
    frame.render_widget(block, regions.map);

    let map_widget = MapWidget {
        layer: app.layer(),
        controller: &app.controller,
    };
    frame.render_widget(map_widget, inner);

    if let Some(label) = app.controller.loading_label() {
        render_centered_note(frame, label, inner, Style::default().fg(INK).bg(Color::White));
    }

    for (i, banner) in app.controller.banners().iter().enumerate() {
        let y = inner.y + 1 + i as u16;
        if y >= inner.y + inner.height {
            break;
        }
        let area = Rect::new(inner.x + 1, y, inner.width.saturating_sub(2), 1);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(Span::styled(format!("✕ {banner}"), Style::default().fg(ERROR).bg(Color::White))),
            area,
        );
    }

    let tooltip = app.controller.tooltip();
    if tooltip.visible && app.screen == Screen::Map {
        let text = format!(" {} ", tooltip.text);
        let width = (Line::from(text.as_str()).width() as u16).min(inner.width);
        let (x, y) = surface::tooltip_anchor(tooltip.position, width, inner);
        let area = Rect::new(x, y, width, 1).intersection(inner);
        frame.render_widget(
            Paragraph::new(Span::styled(
                text,
                Style::default().fg(surface::TOOLTIP_FG).bg(surface::TOOLTIP_BG),
            )),
            area,
        );
    }
}

fn render_centered_note(frame: &mut Frame, text: &str, area: Rect, style: Style) {
    let width = (Line::from(text).width() as u16 + 4).min(area.width);
    let note = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height / 2,
        width,
        1,
    )
    .intersection(area);
    frame.render_widget(Clear, note);
    frame.render_widget(
        Paragraph::new(Span::styled(text.to_string(), style)).alignment(Alignment::Center).style(style),
        note,
    );
}

/// Filled shapes with Braille outlines on top
struct MapWidget<'a> {
    layer: Option<&'a ShapeLayer>,
    controller: &'a MapController,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mode = self.controller.mode();
        for row in 0..area.height {
            for col in 0..area.width {
                let (x, y) = (area.x + col, area.y + row);
                let cell = &mut buf[(x, y)];
                cell.set_char(' ').set_bg(surface::OCEAN);

                let Some(layer) = self.layer else { continue };
                if let Some(idx) = layer.owner_at(col, row) {
                    cell.set_bg(surface::color(mode, self.controller.shape_fill(idx)));
                }
                if let Some(ch) = layer.outline_at(col, row) {
                    cell.set_char(ch).set_fg(surface::STROKE);
                }
            }
        }
    }
}

fn render_sidebar(frame: &mut Frame, controller: &MapController, area: Rect) {
    let Some(state) = controller.selected() else {
        return;
    };
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(MUTED));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled(
            " State ",
            Style::default().fg(SUCCESS).bg(Color::Rgb(0xD4, 0xE8, 0xD9)),
        )),
        Line::from(Span::styled(
            state.name.clone(),
            Style::default().fg(INK).add_modifier(Modifier::BOLD),
        )),
    ];
    if !state.capital.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Capital: {}", state.capital),
            Style::default().fg(MUTED),
        )));
    }
    lines.push(Line::from(Span::styled(state.code.clone(), Style::default().fg(MUTED))));
    lines.push(Line::default());

    let cities = controller.cities();
    let mut heading = vec![Span::styled(
        "Cities in database",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if !controller.cities_status().is_loading() {
        heading.push(Span::raw(" "));
        heading.push(Span::styled(
            format!(" {} ", cities.len()),
            Style::default().fg(INK).bg(Color::Rgb(0xEE, 0xF6, 0xFA)),
        ));
    }
    lines.push(Line::from(heading));

    match controller.cities_status() {
        LoadStatus::Loading => lines.push(Line::from(Span::styled("Loading…", Style::default().fg(Color::Cyan)))),
        LoadStatus::Failed(e) => lines.push(Line::from(Span::styled(format!("✕ {e}"), Style::default().fg(ERROR)))),
        _ if cities.is_empty() => lines.push(Line::from(Span::styled(
            format!("ℹ No cities found for {}.", state.name),
            Style::default().fg(MUTED),
        ))),
        _ => lines.extend(cities.iter().map(|city| {
            Line::from(vec![
                Span::styled(" City ", Style::default().fg(Color::Rgb(0x8B, 0x5E, 0x34))),
                Span::raw(city.clone()),
            ])
        })),
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(1), inner.height));
}

/// One-line stand-in for the sidebar on narrow terminals
fn selection_note(state: &SelectedState, status: &LoadStatus, cities: usize) -> String {
    let detail = match status {
        LoadStatus::Loading => "loading cities…".to_string(),
        LoadStatus::Failed(e) => format!("✕ {e}"),
        _ if cities == 1 => "1 city (widen the terminal to list it)".to_string(),
        _ => format!("{cities} cities (widen the terminal to list them)"),
    };
    format!(" {} ({}): {detail}", state.name, state.code)
}

fn swatch(mode: ViewMode, tone: Tone, label: String) -> Vec<Span<'static>> {
    vec![
        Span::styled("██", Style::default().fg(surface::color(mode, Fill { tone, hovered: false }))),
        Span::raw(format!(" {label}   ")),
    ]
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let mode = app.controller.mode();
    let (items, endpoint) = match mode {
        ViewMode::World => (
            [
                swatch(mode, Tone::Present, format!("In database ({})", app.controller.countries().total())),
                swatch(mode, Tone::Invite, "USA — click to drill in".to_string()),
                swatch(mode, Tone::Absent, "Not in database".to_string()),
            ]
            .concat(),
            "Endpoint: GET /countries",
        ),
        ViewMode::Us => (
            [
                swatch(mode, Tone::Present, format!("In database ({})", app.controller.states().total())),
                swatch(mode, Tone::Absent, "Not in database".to_string()),
            ]
            .concat(),
            "Endpoint: GET /states · GET /cities/search",
        ),
    };

    let mut line = vec![Span::raw(" ")];
    line.extend(items);
    frame.render_widget(Paragraph::new(Line::from(line)), area);
    frame.render_widget(
        Paragraph::new(Span::styled(format!("{endpoint} @ {} ", app.endpoint), Style::default().fg(MUTED)))
            .alignment(Alignment::Right),
        area,
    );
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (session_label, session_color) = if app.session.is_authenticated() {
        ("signed in", Color::Green)
    } else {
        ("signed out", MUTED)
    };
    let hints = match app.screen {
        Screen::Map => " | q:quit b/esc:back x:close l:login g:register o:sign out",
        Screen::Login | Screen::Register => " | tab:next field enter:submit esc:map",
    };

    let status = Line::from(vec![
        Span::styled(" Session: ", Style::default().fg(MUTED)),
        Span::styled(session_label, Style::default().fg(session_color)),
        Span::styled(hints, Style::default().fg(MUTED)),
    ]);
    frame.render_widget(Paragraph::new(status), area);
}

fn render_form(frame: &mut Frame, app: &App, form: &AuthForm, area: Rect) {
    let kind = form.kind();
    let width = 44u16.min(area.width);
    let height = (kind.fields().len() as u16 * 2 + 7).min(area.height);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} ", kind.title()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = Vec::new();
    if app.session.is_authenticated() {
        if let FormStatus::Succeeded(message) = form.status() {
            lines.push(Line::from(Span::styled(*message, Style::default().fg(SUCCESS))));
        }
        lines.push(Line::from("You are signed in."));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "o: sign out   esc: back to the map",
            Style::default().fg(MUTED),
        )));
    } else {
        for &field in kind.fields() {
            lines.push(Line::from(Span::styled(field.label(), Style::default().fg(MUTED))));
            lines.push(field_line(form, field));
        }
        lines.push(Line::default());

        let submitting = form.status() == &FormStatus::Submitting;
        let button = if submitting { kind.progress_label() } else { kind.submit_label() };
        lines.push(Line::from(Span::styled(
            format!(" {button} "),
            Style::default().fg(Color::White).bg(Color::Rgb(0x24, 0x78, 0xA0)),
        )));

        match form.status() {
            FormStatus::Failed(message) => {
                lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(ERROR))))
            }
            FormStatus::Succeeded(message) => {
                lines.push(Line::from(Span::styled(*message, Style::default().fg(SUCCESS))))
            }
            _ => {}
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn field_line(form: &AuthForm, field: Field) -> Line<'static> {
    let value = form.value(field);
    let shown = if field.is_secret() {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let focused = form.focused() == field;
    let cursor = if focused { "▏" } else { "" };
    let style = if focused {
        Style::default().fg(INK).bg(Color::Rgb(0xEE, 0xF6, 0xFA))
    } else {
        Style::default()
    };
    Line::from(Span::styled(format!("{shown}{cursor}"), style))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texas() -> SelectedState {
        SelectedState {
            name: "Texas".into(),
            code: "TX".into(),
            capital: "Austin".into(),
        }
    }

    #[test]
    fn test_sidebar_beside_map_when_wide() {
        let (map, sidebar, note) = split_body(Rect::new(0, 2, 120, 30), true);
        let sidebar = sidebar.unwrap();
        assert_eq!(sidebar.width, SIDEBAR_WIDTH);
        assert_eq!(map.width + sidebar.width, 120);
        assert!(note.is_none());
    }

    #[test]
    fn test_narrow_terminal_keeps_selection_visible() {
        let body = Rect::new(0, 2, SIDEBAR_WIDTH * 2, 20);
        let (map, sidebar, note) = split_body(body, true);
        assert_eq!(map, body);
        assert!(sidebar.is_none());
        assert_eq!(note, Some(Rect::new(0, 21, SIDEBAR_WIDTH * 2, 1)));

        let (map, sidebar, note) = split_body(body, false);
        assert_eq!(map, body);
        assert!(sidebar.is_none() && note.is_none());
    }

    #[test]
    fn test_selection_note_text() {
        let state = texas();
        assert_eq!(
            selection_note(&state, &LoadStatus::Loaded, 12),
            " Texas (TX): 12 cities (widen the terminal to list them)"
        );
        assert_eq!(
            selection_note(&state, &LoadStatus::Loaded, 1),
            " Texas (TX): 1 city (widen the terminal to list it)"
        );
        assert_eq!(selection_note(&state, &LoadStatus::Loading, 0), " Texas (TX): loading cities…");
        assert_eq!(
            selection_note(&state, &LoadStatus::Failed("Request failed: 500".into()), 0),
            " Texas (TX): ✕ Request failed: 500"
        );
    }
}
