//! Live terminal dashboard of the published device values.

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Row, Table};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use triton_sim::publish::{self, TextRecord};
use triton_sim::text::NATIVE_STRING_LIMIT;
use triton_sim::SharedDevice;

const COLUMNS: usize = 3;

// Long text is summarised so one value cannot swamp a table cell.
fn cell(value: &str) -> String {
    match publish::text_record(value) {
        TextRecord::Native => value.to_string(),
        TextRecord::Waveform => {
            let head: String = value.chars().take(NATIVE_STRING_LIMIT - 1).collect();
            format!("{}... ({} chars)", head, value.chars().count())
        }
    }
}

/// Redraws until 'q'/Esc is pressed or `stop` is raised elsewhere.
pub fn run(device: &SharedDevice, stop: &AtomicBool) -> io::Result<()> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = draw_loop(&mut terminal, device, stop);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn draw_loop<B: Backend>(terminal: &mut Terminal<B>, device: &SharedDevice, stop: &AtomicBool) -> io::Result<()> {
    while !stop.load(Ordering::Relaxed) {
        let rows = device.inspect(publish::snapshot);
        terminal.draw(|frame| render(frame, &rows))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    stop.store(true, Ordering::Relaxed);
                }
            }
        }
    }
    Ok(())
}

fn render(frame: &mut Frame, rows: &[(String, String)]) {
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, COLUMNS as u32); COLUMNS])
        .split(frame.size());

    let per_column = rows.len().div_ceil(COLUMNS).max(1);
    for (area, chunk) in areas.iter().zip(rows.chunks(per_column)) {
        let table_rows = chunk
            .iter()
            .map(|(name, value)| Row::new(vec![name.clone(), cell(value)]));
        let table = Table::new(table_rows, [Constraint::Length(22), Constraint::Min(8)])
            .header(Row::new(vec!["PV", "Value"]).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().borders(Borders::ALL).title("Triton (q to quit)"));
        frame.render_widget(table, *area);
    }
}
