use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::error;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Block, Borders, Paragraph,
    },
    Frame, Terminal,
};

use crate::app::{App, Monitor};
use crate::constants::{DRY_UPPER, MAX_X_LABELS, MODERATE_UPPER, REDRAW_INTERVAL_MS, WET_UPPER, Y_BOUNDS};
use crate::util::{format_percent, row_center_value, tick_indices, value_row, Band};

const Y_AXIS_WIDTH: u16 = 6;
const THRESHOLD_DASHES: usize = 40;

fn band_color(band: Band) -> Color {
    match band {
        Band::Dry => Color::Rgb(70, 20, 20),
        Band::Moderate => Color::Rgb(70, 65, 15),
        Band::Wet => Color::Rgb(15, 35, 80),
    }
}

pub fn run(monitor: Arc<Monitor>, threshold: f64, port: &str) -> io::Result<()> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(threshold);
    let res = run_app_loop(&mut terminal, app, &monitor, port);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("chart window failed: {:?}", err);
    }
    res
}

fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    monitor: &Monitor,
    port: &str,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(REDRAW_INTERVAL_MS);
    app.on_tick(monitor);

    while monitor.is_running() {
        terminal.draw(|f| draw(f, &app, port))?;

        // Handle input until the next redraw is due
        let timeout = tick_rate.checked_sub(app.last_tick.elapsed()).unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    return Ok(());
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.on_tick(monitor);
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}

// 'q', Esc or Ctrl-C
fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub fn draw(f: &mut Frame, app: &App, port: &str) {
    // ============= whole screen layout ============
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Min(12),   // Chart Box
            Constraint::Length(1), // Bottom Status Bar
        ].as_ref())
        .split(f.size());

    let chart_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Water Sensor Data [{}] ", port))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(chart_block.clone(), main_chunks[0]);

    let inner_area = chart_block.inner(main_chunks[0]);
    let graph_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(78), Constraint::Percentage(22)].as_ref())
        .split(inner_area);

    draw_chart(f, app, graph_chunks[0]);
    draw_side_panel(f, app, graph_chunks[1]);
    draw_status_bar(f, app, main_chunks[1]);
}

fn draw_chart(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // y label
            Constraint::Min(3),    // plot
            Constraint::Length(1), // x ticks
            Constraint::Length(1), // x label
        ].as_ref())
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(Y_AXIS_WIDTH), Constraint::Min(4)].as_ref())
        .split(rows[1]);
    let (axis_area, plot_area) = (cols[0], cols[1]);

    f.render_widget(
        Paragraph::new(Span::styled("Moisture Level (%)", Style::default().fg(Color::Gray))),
        rows[0],
    );

    // Y axis labels, aligned with the plot rows
    let mut y_lines = vec![Line::from(""); axis_area.height as usize];
    for v in [0.0, DRY_UPPER, MODERATE_UPPER, WET_UPPER] {
        let row = value_row(v, axis_area.height, Y_BOUNDS) as usize;
        if let Some(slot) = y_lines.get_mut(row) {
            *slot = Line::from(Span::styled(format!("{:>4} ┤", v), Style::default().fg(Color::DarkGray)));
        }
    }
    f.render_widget(Paragraph::new(y_lines), axis_area);

    let snapshot = &app.snapshot;
    let points = snapshot.points();
    let warnings = snapshot.warning_points();
    let x_max = (snapshot.len().saturating_sub(1) as f64).max(1.0);
    let threshold = app.threshold;
    let waiting = snapshot.is_empty();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, x_max])
        .y_bounds(Y_BOUNDS)
        .paint(|ctx| {
            // Dashed warning threshold
            let dash = x_max / THRESHOLD_DASHES as f64;
            for k in (0..THRESHOLD_DASHES).step_by(2) {
                let x1 = k as f64 * dash;
                ctx.draw(&CanvasLine { x1, y1: threshold, x2: x1 + dash, y2: threshold, color: Color::Red });
            }
            ctx.layer();

            if waiting {
                ctx.print(0.0, 50.0, Line::styled("Waiting for data...", Style::default().fg(Color::DarkGray)));
                return;
            }
            for pair in points.windows(2) {
                ctx.draw(&CanvasLine {
                    x1: pair[0].0,
                    y1: pair[0].1,
                    x2: pair[1].0,
                    y2: pair[1].1,
                    color: Color::Green,
                });
            }
            ctx.draw(&Points { coords: &points, color: Color::LightGreen });
            ctx.layer();

            // Readings above the threshold
            ctx.draw(&Points { coords: &warnings, color: Color::Red });
        });
    f.render_widget(canvas, plot_area);
    paint_bands(f, plot_area);

    // X axis: thinned HH:MM:SS labels
    let ticks: Vec<(usize, String)> = tick_indices(snapshot.len(), MAX_X_LABELS)
        .into_iter()
        .map(|i| (i, snapshot.timestamps[i].format("%H:%M:%S").to_string()))
        .collect();
    let x_area = Rect { x: plot_area.x, width: plot_area.width, ..rows[2] };
    f.render_widget(
        Paragraph::new(x_tick_line(&ticks, snapshot.len(), x_area.width as usize))
            .style(Style::default().fg(Color::DarkGray)),
        x_area,
    );
    let x_label = Rect { x: plot_area.x, width: plot_area.width, ..rows[3] };
    f.render_widget(Paragraph::new(Span::styled("Time", Style::default().fg(Color::Gray))), x_label);
}

// Tint each plot row with the band its centre value falls in.
fn paint_bands(f: &mut Frame, area: Rect) {
    let buf = f.buffer_mut();
    for row in 0..area.height {
        let value = row_center_value(row, area.height, Y_BOUNDS);
        if let Some(band) = Band::classify(value) {
            let line = Rect { x: area.x, y: area.y + row, width: area.width, height: 1 };
            buf.set_style(line, Style::default().bg(band_color(band)));
        }
    }
}

/// Lay out `(index, label)` pairs on a row `width` columns wide, with index
/// 0 at the left edge and `len - 1` at the right. Overlapping labels are skipped.
pub fn x_tick_line(ticks: &[(usize, String)], len: usize, width: usize) -> String {
    let mut row = vec![' '; width];
    let mut next_free = 0;
    for (i, label) in ticks {
        let chars: Vec<char> = label.chars().collect();
        if chars.len() > width {
            break;
        }
        let col = if len <= 1 {
            0
        } else {
            (*i as f64 * width.saturating_sub(1) as f64 / (len - 1) as f64).round() as usize
        };
        let start = col.min(width - chars.len());
        if start < next_free {
            continue;
        }
        row[start..start + chars.len()].copy_from_slice(&chars);
        next_free = start + chars.len() + 1;
    }
    row.into_iter().collect::<String>().trim_end().to_string()
}

fn draw_side_panel(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(5)].as_ref())
        .split(area);

    let latest = app.snapshot.latest();
    let (latest_text, latest_color) = match latest {
        Some((_, v, true)) => (format_percent(v), Color::Red),
        Some((_, v, false)) => (format_percent(v), Color::Green),
        None => ("--".to_string(), Color::DarkGray),
    };
    let latest_time = latest.map(|(t, _, _)| t.format("%H:%M:%S").to_string()).unwrap_or_default();
    let peak = app
        .stats
        .peak
        .map(|(v, t)| format!("{} (@{})", format_percent(v), t.format("%H:%M:%S")))
        .unwrap_or_else(|| "--".to_string());

    let stats_text = vec![
        Line::from(vec![
            Span::raw("● "),
            Span::styled(latest_text, Style::default().fg(latest_color).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {}", latest_time), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![Span::styled("  Peak:     ", Style::default().fg(Color::DarkGray)), Span::raw(peak)]),
        Line::from(vec![Span::styled("  Readings: ", Style::default().fg(Color::DarkGray)), Span::raw(app.stats.accepted.to_string())]),
        Line::from(vec![Span::styled("  Invalid:  ", Style::default().fg(Color::DarkGray)), Span::raw(app.stats.rejected.to_string())]),
        Line::from(vec![Span::styled("  Errors:   ", Style::default().fg(Color::DarkGray)), Span::raw(app.stats.read_errors.to_string())]),
    ];
    f.render_widget(
        Paragraph::new(stats_text).block(Block::default().title(" Current ").borders(Borders::TOP)),
        chunks[0],
    );

    let mut legend = vec![
        Line::from(vec![
            Span::styled("╌╌ ", Style::default().fg(Color::Red)),
            Span::raw(format!("Warning Threshold ({}%)", app.threshold)),
        ]),
        Line::from(vec![Span::styled("●  ", Style::default().fg(Color::Red)), Span::raw("Above threshold")]),
    ];
    for band in Band::ALL {
        legend.push(Line::from(vec![
            Span::styled("██ ", Style::default().fg(band_color(band))),
            Span::raw(band.label()),
        ]));
    }
    f.render_widget(
        Paragraph::new(legend).block(Block::default().title(" Legend ").borders(Borders::TOP)),
        chunks[1],
    );
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let event = app.stats.last_event.clone().unwrap_or_else(|| "OK".to_string());
    let status_content = Line::from(vec![
        Span::styled(" WATER MONITOR ", Style::default().bg(Color::White).fg(Color::Black).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(event, Style::default().fg(Color::Yellow)),
        Span::raw(" | Press 'q' to quit"),
    ]);

    let status_bar = Paragraph::new(status_content)
        .style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use ratatui::backend::TestBackend;

    use crate::reading::Reading;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| draw(f, app, "/dev/ttyUSB0")).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn renders_empty_window() {
        let app = App::new(70.0);
        let screen = render(&app);
        assert!(screen.contains("Water Sensor Data [/dev/ttyUSB0]"));
        assert!(screen.contains("Warning Threshold (70%)"));
        assert!(screen.contains("Dry (0-30%)"));
        assert!(screen.contains("Press 'q' to quit"));
    }

    #[test]
    fn renders_readings_and_counters() {
        let monitor = Monitor::new(20);
        for v in [12.0, 45.0, 88.5] {
            monitor.record(&Reading::new(v, 70.0, Local::now()));
        }
        monitor.record_rejected("Received invalid data: ??".to_string());

        let mut app = App::new(70.0);
        app.on_tick(&monitor);
        let screen = render(&app);
        assert!(screen.contains("88.5%"));
        assert!(screen.contains("Received invalid data: ??"));
        assert!(screen.contains("Moisture Level (%)"));
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL)));

        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&release));
    }

    #[test]
    fn tick_labels_span_the_row() {
        let ticks = vec![(0, "a".to_string()), (9, "b".to_string())];
        assert_eq!(x_tick_line(&ticks, 10, 10), "a        b");
    }

    #[test]
    fn overlapping_tick_labels_are_skipped() {
        let ticks = vec![(0, "12:00:00".to_string()), (1, "12:00:01".to_string()), (9, "12:00:09".to_string())];
        let line = x_tick_line(&ticks, 10, 20);
        assert_eq!(line, "12:00:00    12:00:09");
    }
}
