use std::collections::HashMap;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use volley::{DrawSurface, TextField};

/// The scene as batched by the game loop: normalized rectangles plus
/// labeled text slots, repainted wholesale on every flushed frame.
pub struct SceneBuffer {
    rects: Vec<[f64; 4]>,
    middle_line: bool,
    texts: HashMap<TextField, String>,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self {
            rects: Vec::new(),
            middle_line: false,
            texts: HashMap::new(),
        }
    }

    fn text(&self, field: TextField) -> &str {
        self.texts.get(&field).map(String::as_str).unwrap_or("")
    }
}

impl DrawSurface for SceneBuffer {
    fn clear(&mut self) {
        self.rects.clear();
        self.middle_line = false;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.rects.push([x, y, width, height]);
    }

    fn draw_middle_line(&mut self) {
        self.middle_line = true;
    }

    fn set_text(&mut self, field: TextField, value: &str) {
        self.texts.insert(field, value.to_string());
    }

    // The scene stays batched until the run loop paints it; there is
    // no display to push to from here.
    fn flush(&mut self) {}
}

pub fn render(frame: &mut Frame, scene: &SceneBuffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_scoreboard(frame, chunks[0], scene);
    render_court(frame, chunks[1], scene);
    render_footer(frame, chunks[2], scene);
}

fn render_scoreboard(frame: &mut Frame, area: Rect, scene: &SceneBuffer) {
    let block = Block::default()
        .title(" volley ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = Line::from(vec![
        Span::styled(
            scene.text(TextField::LeftName).to_string(),
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} : {}",
                scene.text(TextField::LeftScore),
                scene.text(TextField::RightScore)
            ),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            scene.text(TextField::RightName).to_string(),
            Style::default().fg(Color::White),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Maps the normalized `[0,1] x [0,1]` play field onto the inner cells
/// of a bordered block.
fn render_court(frame: &mut Frame, area: Rect, scene: &SceneBuffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let buf = frame.buffer_mut();

    if scene.middle_line {
        let x = inner.x + inner.width / 2;
        for (i, y) in (inner.y..inner.y + inner.height).enumerate() {
            // Dashed: every other cell.
            if i % 2 == 0 {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol("│").set_style(Style::default().fg(Color::DarkGray));
                }
            }
        }
    }

    for &[x, y, w, h] in &scene.rects {
        let x0 = inner.x + (x * inner.width as f64) as u16;
        let y0 = inner.y + (y * inner.height as f64) as u16;
        // Even the smallest figure stays visible as one cell.
        let x1 = (inner.x + ((x + w) * inner.width as f64).ceil() as u16).max(x0 + 1);
        let y1 = (inner.y + ((y + h) * inner.height as f64).ceil() as u16).max(y0 + 1);

        for cx in x0..x1.min(inner.x + inner.width) {
            for cy in y0..y1.min(inner.y + inner.height) {
                if let Some(cell) = buf.cell_mut((cx, cy)) {
                    cell.set_symbol("█").set_style(Style::default().fg(Color::White));
                }
            }
        }
    }
}

fn render_footer(frame: &mut Frame, area: Rect, scene: &SceneBuffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut spans = Vec::new();
    let ping = scene.text(TextField::Ping);
    if !ping.is_empty() {
        spans.push(Span::styled("ping ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(ping.to_string(), Style::default().fg(Color::White)));
        spans.push(Span::raw("  "));
    }
    let session_id = scene.text(TextField::SessionId);
    if !session_id.is_empty() {
        spans.push(Span::styled("session ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            session_id.to_string(),
            Style::default().fg(Color::White),
        ));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        "q to quit",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
