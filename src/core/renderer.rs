/// Board painting. Everything here is a pure function of the session, so
/// redrawing the same state yields the same buffer.
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::core::input::KEY_HELP;
use crate::core::protocol::{Card, Seat, TableSnapshot};
use crate::core::session::{ConnectionState, Session};

/// The board has a fixed size; larger terminals leave the rest blank and
/// smaller ones clip it.
pub const BOARD_WIDTH: u16 = 80;
pub const BOARD_HEIGHT: u16 = 24;

const BOARD_STYLE: Style = Style::new().fg(Color::Black).bg(Color::White);

pub fn board_area(area: Rect) -> Rect {
    Rect::new(area.x, area.y, BOARD_WIDTH.min(area.width), BOARD_HEIGHT.min(area.height))
}

/// Draws the whole board for the current session.
pub fn render(frame: &mut Frame, session: &Session) {
    let board = board_area(frame.area());
    frame.render_widget(Clear, board);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Poker Table ")
        .style(BOARD_STYLE);
    let inner = block.inner(board);
    frame.render_widget(block, board);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Community cards
            Constraint::Length(1),
            Constraint::Length(1), // "Player Hands:"
            Constraint::Min(0),    // Seats
            Constraint::Length(1), // Pot
            Constraint::Length(1), // Current bet
            Constraint::Length(1), // Status
            Constraint::Length(1), // Controls
        ])
        .split(inner);

    let snapshot = session.snapshot();

    let mut community = vec![Span::raw(" Community Cards: ")];
    if let Some(table) = snapshot {
        community.extend(table.community_cards.iter().map(card_span));
    }
    frame.render_widget(Paragraph::new(Line::from(community)), chunks[0]);

    frame.render_widget(Paragraph::new(" Player Hands:"), chunks[2]);
    if let Some(table) = snapshot {
        let seats: Vec<Line> = table.players.iter().map(seat_line).collect();
        frame.render_widget(Paragraph::new(seats), chunks[3]);
    }

    render_totals(frame, snapshot, chunks[4], chunks[5]);
    frame.render_widget(Paragraph::new(status_line(session)), chunks[6]);
    frame.render_widget(
        Paragraph::new(KEY_HELP).style(Style::default().add_modifier(Modifier::DIM)),
        chunks[7],
    );
}

fn render_totals(frame: &mut Frame, snapshot: Option<&TableSnapshot>, pot: Rect, bet: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match snapshot {
        Some(table) => {
            frame.render_widget(Paragraph::new(format!(" Pot: {}", table.pot)).style(bold), pot);
            frame.render_widget(
                Paragraph::new(format!(" Current Bet: {}", table.current_bet)).style(bold),
                bet,
            );
        }
        None => {
            frame.render_widget(Paragraph::new(" Waiting for the table..."), pot);
        }
    }
}

fn status_line(session: &Session) -> Line<'static> {
    let color = match session.state() {
        ConnectionState::Connecting => Color::Blue,
        ConnectionState::Open => Color::Green,
        ConnectionState::Closed => Color::DarkGray,
        ConnectionState::Errored => Color::Red,
    };
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(session.state().to_string(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ];
    if session.skipped() > 0 {
        spans.push(Span::raw(format!(" | skipped: {}", session.skipped())));
    }
    if let Some(notice) = session.notice() {
        spans.push(Span::raw(format!(" | {notice}")));
    }
    Line::from(spans)
}

fn seat_line(seat: &Seat) -> Line<'static> {
    let mut spans = vec![Span::raw(format!("   {}: {} ", seat.name, seat.chips))];
    spans.extend(seat.hand.iter().map(card_span));
    Line::from(spans)
}

fn card_span(card: &Card) -> Span<'static> {
    let color = if card.is_red() { Color::Red } else { Color::Black };
    Span::styled(format!("{card} "), Style::default().fg(color))
}
