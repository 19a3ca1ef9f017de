//! UI rendering for the TUI.

use super::app::{App, FocusArea, Mode, SettingsRow};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};

/// Set up the terminal for TUI rendering.
pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to normal mode.
pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Render the entire UI.
pub fn render(app: &App, frame: &mut Frame) {
    let size = frame.area();

    // Main layout: header, body, input, footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(8),    // Body
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    render_header(app, frame, chunks[0]);
    render_body(app, frame, chunks[1]);
    render_input(app, frame, chunks[2]);
    render_status_bar(app, frame, chunks[3]);

    // Overlay modals
    match app.mode {
        Mode::Help => render_help_overlay(app, frame, size),
        Mode::Settings => render_settings_overlay(app, frame, size),
        Mode::Notice => render_notice(app, frame, size),
        _ => {}
    }
}

fn border_style(app: &App, focused: bool) -> Style {
    if focused {
        Style::default().fg(app.theme.accent)
    } else {
        Style::default().fg(app.theme.border)
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let open = app.console.device().is_some();
    let status = if open { "Open" } else { "Closed" };

    let mut spans = vec![
        Span::styled(
            " serial-tool ",
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.connection_summary(), Style::default().fg(app.theme.fg)),
        Span::raw(" | "),
        Span::styled(
            status,
            Style::default().fg(if open {
                app.theme.connected
            } else {
                app.theme.inactive
            }),
        ),
    ];
    let dropped = app.console.dropped_chunks();
    if dropped > 0 {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("dropped {dropped} chunk(s)"),
            Style::default().fg(app.theme.error),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(app.theme.selection));
    frame.render_widget(header, area);
}

fn render_body(app: &App, frame: &mut Frame, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(30)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(columns[0]);

    render_port_list(app, frame, left[0]);
    render_history(app, frame, left[1]);
    render_receive(app, frame, columns[1]);
}

fn render_port_list(app: &App, frame: &mut Frame, area: Rect) {
    let open_device = app.console.device();

    let items: Vec<ListItem> = if app.console.ports().is_empty() {
        vec![ListItem::new("No serial ports found").style(Style::default().fg(app.theme.inactive))]
    } else {
        app.console
            .ports()
            .iter()
            .map(|port| {
                let is_open = open_device == Some(port.device.as_str());
                let prefix = if is_open { "● " } else { "  " };
                let style = if is_open {
                    Style::default().fg(app.theme.connected)
                } else {
                    Style::default().fg(app.theme.fg)
                };
                ListItem::new(format!("{}{}", prefix, port.label())).style(style)
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, app.focus == FocusArea::Ports))
                .title(" Ports "),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.selection)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.console.ports().is_empty() {
        state.select(Some(app.selected_port));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_history(app: &App, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .console
        .history()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mark = if app.marked_history.contains(&i) { "* " } else { "  " };
            ListItem::new(format!("{}{}", mark, entry.rendered()))
                .style(Style::default().fg(app.theme.sent))
        })
        .collect();

    let title = format!(" History ({}) ", app.console.history().len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, app.focus == FocusArea::History))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.selection)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.console.history().is_empty() {
        state.select(Some(app.selected_history));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_receive(app: &App, frame: &mut Frame, area: Rect) {
    let display = app.console.display();
    let title = if display.hex_display {
        " Receive (Hex) "
    } else {
        " Receive "
    };

    let text = visible_tail(app.console.receive_text(), app.scrollback_lines);
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2) as usize;

    let scroll = if display.auto_scroll {
        wrapped_height(text, inner_width).saturating_sub(inner_height)
    } else {
        app.scroll_offset as usize
    };

    let widget = Paragraph::new(text.to_string())
        .style(Style::default().fg(app.theme.received))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, app.focus == FocusArea::Receive))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));

    frame.render_widget(widget, area);
}

/// The last `max_lines` lines of `text`.
pub fn visible_tail(text: &str, max_lines: usize) -> &str {
    if max_lines == 0 {
        return "";
    }
    let mut seen = 0;
    for (i, _) in text.rmatch_indices('\n') {
        // a trailing newline does not start a visible line
        if i + 1 == text.len() {
            continue;
        }
        seen += 1;
        if seen == max_lines {
            return &text[i + 1..];
        }
    }
    text
}

/// Rows `text` takes when wrapped at `width` columns.
pub fn wrapped_height(text: &str, width: u16) -> usize {
    let width = width.max(1) as usize;
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum()
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let display = app.console.display();
    let is_focused = app.focus == FocusArea::Input || app.mode == Mode::Insert;

    let mode_indicator = match app.mode {
        Mode::Normal => "[NORMAL]",
        Mode::Insert => "[INSERT]",
        Mode::Command => "[COMMAND]",
        _ => "",
    };
    let send_kind = if display.hex_send { "hex" } else { "text" };
    let newline = if display.append_newline && !display.hex_send {
        " +\\n"
    } else {
        ""
    };
    let title = format!(" Send ({send_kind}{newline}) {mode_indicator} ");

    let content = if app.mode == Mode::Command {
        format!(":{}", app.command_line)
    } else {
        // multi-line payloads (formatted JSON) are shown on one row
        app.input.replace('\n', "⏎")
    };

    let input_widget = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(app, is_focused))
            .title(title),
    );
    frame.render_widget(input_widget, area);

    // Set cursor position
    match app.mode {
        Mode::Insert => {
            let x = area.x + 1 + app.cursor_pos.min(u16::MAX as usize) as u16;
            frame.set_cursor_position((x, area.y + 1));
        }
        Mode::Command => {
            let x = area.x + 2 + app.command_line.chars().count().min(u16::MAX as usize) as u16;
            frame.set_cursor_position((x, area.y + 1));
        }
        _ => {}
    }
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status_text = app
        .status_message
        .clone()
        .unwrap_or_else(|| "Ready".to_string());

    let keybinds = "q:quit i:send o:open/close s:settings x:hex Tab:focus ?:help :cmd";

    let status = Line::from(vec![
        Span::styled(
            format!(" {} ", status_text),
            Style::default().fg(app.theme.fg),
        ),
        Span::raw(" | "),
        Span::styled(keybinds, Style::default().fg(app.theme.inactive)),
    ]);

    let status_widget = Paragraph::new(status).style(Style::default().bg(app.theme.selection));
    frame.render_widget(status_widget, area);
}

fn popup_block<'a>(app: &App, title: &'a str, color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .style(Style::default().bg(app.theme.bg))
}

fn render_help_overlay(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 80, area);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        heading("Normal mode"),
        Line::from("  q            Quit"),
        Line::from("  i / Enter    Edit the send box"),
        Line::from("  o            Open selected port / close"),
        Line::from("  r            Refresh port list"),
        Line::from("  s            Port settings"),
        Line::from("  x            Toggle hex display"),
        Line::from("  Ctrl+L       Clear receive pane"),
        Line::from("  Tab          Cycle focus"),
        Line::from("  j/k          Move selection / scroll"),
        Line::from("  History: Enter resend, Space mark, d delete, D clear"),
        Line::from(""),
        heading("Send box"),
        Line::from("  Enter        Send    Esc  Back to normal mode"),
        Line::from(""),
        heading("Commands"),
        Line::from("  :open [dev]  :close  :refresh  :save <path>"),
        Line::from("  :hex  :hexsend  :ts  :tsfmt <pattern>  :nl  :scroll"),
        Line::from("  :baud <n>  :databits <n>  :parity <p>  :stopbits <s>"),
        Line::from("  :clear  :clearhistory  :json  :settings  :quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or F1 to close",
            Style::default().fg(app.theme.inactive),
        )),
    ];

    let help_widget = Paragraph::new(help_text)
        .block(popup_block(app, " Help ", app.theme.accent))
        .wrap(Wrap { trim: false });

    frame.render_widget(help_widget, popup_area);
}

fn render_settings_overlay(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 60, area);
    frame.render_widget(Clear, popup_area);

    let framing = app.console.framing();
    let display = app.console.display();
    let on_off = |on: bool| (if on { "on" } else { "off" }).to_string();

    let items: Vec<ListItem> = SettingsRow::ALL
        .iter()
        .map(|row| {
            let value = match row {
                SettingsRow::Baud => framing.baud_rate().to_string(),
                SettingsRow::DataBits => framing.data_bits().to_string(),
                SettingsRow::Parity => framing.parity().to_string(),
                SettingsRow::StopBits => framing.stop_bits().to_string(),
                SettingsRow::HexDisplay => on_off(display.hex_display),
                SettingsRow::HexSend => on_off(display.hex_send),
                SettingsRow::Timestamps => on_off(display.timestamps),
                SettingsRow::TimestampFormat => display.timestamp_format.clone(),
                SettingsRow::AutoScroll => on_off(display.auto_scroll),
                SettingsRow::AppendNewline => on_off(display.append_newline),
            };
            ListItem::new(format!("{:<18} < {} >", row.label(), value))
        })
        .collect();

    let list = List::new(items)
        .block(popup_block(app, " Settings (←/→ change, Esc close) ", app.theme.accent))
        .style(Style::default().fg(app.theme.fg))
        .highlight_style(
            Style::default()
                .bg(app.theme.selection)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default().with_selected(Some(app.settings_row));
    frame.render_stateful_widget(list, popup_area, &mut state);
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };
    let popup_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup_area);

    let title = format!(" {} ", notice.title);
    let text = vec![
        Line::from(notice.message.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter or Esc",
            Style::default().fg(app.theme.inactive),
        )),
    ];
    let widget = Paragraph::new(text)
        .block(popup_block(app, &title, app.theme.error))
        .style(Style::default().fg(app.theme.fg))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, popup_area);
}

/// Create a centered rectangle with the given percentage of the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DisplayConfig};
    use crate::console::Console;
    use crate::port::{MockPortOpener, MockSerialPort, SerialConfig};
    use crate::session::{SerialSession, SessionOptions};
    use ratatui::backend::TestBackend;

    #[test]
    fn test_visible_tail() {
        assert_eq!(visible_tail("a\nb\nc", 2), "b\nc");
        assert_eq!(visible_tail("a\nb\nc\n", 2), "b\nc\n");
        assert_eq!(visible_tail("a\nb", 5), "a\nb");
        assert_eq!(visible_tail("abc", 0), "");
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height("", 10), 1);
        assert_eq!(wrapped_height("abcdefghij", 10), 1);
        assert_eq!(wrapped_height("abcdefghijk", 10), 2);
        assert_eq!(wrapped_height("a\n\nb", 10), 3);
    }

    #[test]
    fn test_render_every_mode() {
        let session = SerialSession::new(
            MockPortOpener::new(MockSerialPort::new("MOCK0")),
            SessionOptions::default(),
        );
        let console = Console::new(session, SerialConfig::default(), DisplayConfig::default(), 10);
        let mut app = App::new(console, &Config::default());
        app.show_notice("Cannot open port", "Access is denied");

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        for mode in [Mode::Normal, Mode::Insert, Mode::Command, Mode::Help, Mode::Settings, Mode::Notice] {
            app.mode = mode;
            terminal.draw(|frame| render(&app, frame)).unwrap();
        }

        let buffer = terminal.backend().buffer().clone();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("Access is denied"));
        assert!(screen.contains("Closed (115200-8-N-1)"));
    }
}
