use anyhow::Result;
use cas_lookup::{lookup, DataStore, Scope, SearchMatch};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

/// What the message line is showing
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Ready,
    Found(usize),
    Failed(String),
}

pub struct App {
    pub store: DataStore,
    pub input: String,
    pub scope: Scope,
    pub results: Vec<SearchMatch>,
    pub state: TableState,
    pub notice: Notice,
    pub last_query: String,
}

impl App {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            input: String::new(),
            scope: Scope::All,
            results: Vec::new(),
            state: TableState::default(),
            notice: Notice::Ready,
            last_query: String::new(),
        }
    }

    /// Run the current input through the matcher
    pub fn submit(&mut self) {
        self.last_query = self.input.trim().to_string();

        match lookup(&self.store, &self.input, self.scope) {
            Ok(results) => {
                self.notice = Notice::Found(results.len());
                self.results = results;
                self.state.select(Some(0));
            }
            Err(e) => {
                self.notice = Notice::Failed(e.to_string());
                self.results.clear();
                self.state.select(None);
            }
        }
    }

    pub fn cycle_scope(&mut self) {
        self.scope = self.scope.next();
        // Re-run so the table always reflects the visible scope
        if !self.last_query.is_empty() {
            self.submit();
        }
    }

    pub fn selected_match(&self) -> Option<&SearchMatch> {
        self.state.selected().and_then(|i| self.results.get(i))
    }

    pub fn next(&mut self) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i < len - 1 => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.submit(),
                KeyCode::Tab => app.cycle_scope(),
                KeyCode::Down => app.next(),
                KeyCode::Up => app.previous(),
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Char(c) => app.input.push(c),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input + scope
            Constraint::Min(0),    // Results + detail
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_input(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55), // Match list
            Constraint::Percentage(45), // Detail panel
        ])
        .split(chunks[1]);

    render_table(f, content_chunks[0], app);
    render_detail_panel(f, content_chunks[1], app);

    render_status_bar(f, chunks[2], app);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(vec![
        Span::styled(" CAS: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(app.input.clone(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
        Span::raw("   |   "),
        Span::styled("Scope: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            app.scope.code().to_uppercase(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);

    let input = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" CAS Lookup "),
    );

    f.render_widget(input, area);
}

fn source_color(source: &str) -> Color {
    match source {
        "PMNACC" => Color::Magenta,
        "TSCAINV" => Color::Green,
        _ => Color::White,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Source", "CAS Number", "Chemical Name", "Flag"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.results.iter().map(|m| {
        let cells = vec![
            Cell::from(m.source).style(Style::default().fg(source_color(m.source))),
            Cell::from(m.cas_number.clone().unwrap_or_default()),
            Cell::from(truncate(m.chemical_name.as_deref().unwrap_or(""), 40)),
            Cell::from(m.flag.clone().unwrap_or_default()),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Min(20),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Matches "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Record Details ");

    let m = match app.selected_match() {
        Some(m) => m,
        None => {
            let hint = Paragraph::new("Type a CAS number and press Enter").block(block);
            f.render_widget(hint, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let field = |name: &'static str, value: Option<&str>| {
        Line::from(vec![
            Span::styled(format!("  {}: ", name), label),
            Span::raw(value.unwrap_or("-").to_string()),
        ])
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Source: ", label),
            Span::styled(m.source, Style::default().fg(source_color(m.source))),
        ]),
        Line::from(""),
        field("CAS Number", m.cas_number.as_deref()),
        Line::from(""),
        field("Name", m.chemical_name.as_deref()),
        Line::from(""),
        field("Activity", m.activity.as_deref()),
        Line::from(""),
        field("Flag", m.flag.as_deref()),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  FLAG DESCRIPTION",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("  {}", m.flag_description.as_deref().unwrap_or("No flags")),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let notice = match &app.notice {
        Notice::Ready => Span::styled(
            format!(" {} records loaded ", app.store.total_records()),
            Style::default().fg(Color::Cyan),
        ),
        Notice::Found(n) => Span::styled(
            format!(" Row: {}/{} ", selected, n),
            Style::default().fg(Color::Green),
        ),
        Notice::Failed(msg) => Span::styled(format!(" {} ", msg), Style::default().fg(Color::Red)),
    };

    let status_spans = vec![
        notice,
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Search | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Scope | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
