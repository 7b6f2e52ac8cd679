use anyhow::Result;
use cloud_dependency_explorer::logo::{company_logo_chain, initials, resolve};
use cloud_dependency_explorer::{
    normalize_domain, AddFlowState, ClassifierError, CompanyRecord, Completion, Explorer,
    PendingDetection, Provider, ProviderClassifier,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

type DetectionResult = (PendingDetection, Result<String, ClassifierError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Grid,
    Search,
    AddUrl,
    Pills,
}

impl Focus {
    pub fn title(&self) -> &str {
        match self {
            Focus::Grid => "Companies",
            Focus::Search => "Search",
            Focus::AddUrl => "Add Company",
            Focus::Pills => "Providers",
        }
    }
}

pub struct App {
    pub explorer: Explorer,
    pub state: TableState,
    pub focus: Focus,
    pub pill_index: usize,
    pub show_detail: bool,
    pub message: Option<String>,
    classifier: Arc<dyn ProviderClassifier>,
    runtime: Runtime,
    tx: Sender<DetectionResult>,
    rx: Receiver<DetectionResult>,
}

impl App {
    pub fn new(explorer: Explorer, classifier: Arc<dyn ProviderClassifier>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();

        let mut state = TableState::default();
        if !explorer.catalog().is_empty() {
            state.select(Some(0));
        }

        Ok(Self {
            explorer,
            state,
            focus: Focus::Grid,
            pill_index: 0,
            show_detail: false,
            message: None,
            classifier,
            runtime,
            tx,
            rx,
        })
    }

    pub fn visible_len(&self) -> usize {
        self.explorer.visible().len()
    }

    pub fn selected_company(&self) -> Option<&CompanyRecord> {
        self.state
            .selected()
            .and_then(|i| self.explorer.visible().get(i).copied())
    }

    /// Providers in pill order (descending count)
    pub fn pills(&self) -> Vec<Provider> {
        self.explorer
            .stats()
            .providers
            .iter()
            .map(|share| share.provider)
            .collect()
    }

    fn reset_selection(&mut self) {
        if self.visible_len() > 0 {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    // ------------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------------

    /// Returns false when the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }

        match self.focus {
            Focus::Grid => return self.handle_grid_key(key.code),
            Focus::Search => self.handle_search_key(key.code),
            Focus::AddUrl => self.handle_add_key(key.code),
            Focus::Pills => return self.handle_pill_key(key.code),
        }
        true
    }

    fn handle_grid_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('/') => self.focus = Focus::Search,
            KeyCode::Char('a') => self.focus = Focus::AddUrl,
            KeyCode::Tab => self.enter_pills(),
            KeyCode::Char('c') => {
                self.explorer.clear_selection();
                self.reset_selection();
            }
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.reset_selection(),
            KeyCode::End => {
                let len = self.visible_len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        true
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                let mut query = self.explorer.filter().query.clone();
                query.push(c);
                self.explorer.set_query(&query);
                self.reset_selection();
            }
            KeyCode::Backspace => {
                let mut query = self.explorer.filter().query.clone();
                query.pop();
                self.explorer.set_query(&query);
                self.reset_selection();
            }
            KeyCode::Enter => {
                if self.explorer.should_offer_add() {
                    let query = self.explorer.filter().query.clone();
                    self.explorer.set_add_input(&query);
                    self.submit_add();
                }
                self.focus = Focus::Grid;
            }
            KeyCode::Esc => self.focus = Focus::Grid,
            _ => {}
        }
    }

    fn handle_add_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                let mut input = self.explorer.add_flow().input().to_string();
                input.push(c);
                self.explorer.set_add_input(&input);
            }
            KeyCode::Backspace => {
                let mut input = self.explorer.add_flow().input().to_string();
                input.pop();
                self.explorer.set_add_input(&input);
            }
            KeyCode::Enter => {
                self.submit_add();
                self.focus = Focus::Grid;
            }
            KeyCode::Esc => self.focus = Focus::Grid,
            _ => {}
        }
    }

    fn handle_pill_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Left | KeyCode::Char('h') => self.move_pill(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_pill(1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(provider) = self.pills().get(self.pill_index).copied() {
                    self.explorer.toggle_provider(provider);
                }
            }
            KeyCode::Tab | KeyCode::Esc => self.leave_pills(),
            _ => {}
        }
        true
    }

    // ------------------------------------------------------------------------
    // Provider pills (hover = pill under the cursor)
    // ------------------------------------------------------------------------

    fn enter_pills(&mut self) {
        self.focus = Focus::Pills;
        let pills = self.pills();
        if self.pill_index >= pills.len() {
            self.pill_index = 0;
        }
        if let Some(provider) = pills.get(self.pill_index) {
            self.explorer.hover(*provider);
        }
        self.reset_selection();
    }

    fn move_pill(&mut self, delta: i32) {
        let pills = self.pills();
        if pills.is_empty() {
            return;
        }
        let len = pills.len() as i32;
        self.pill_index = (self.pill_index as i32 + delta).rem_euclid(len) as usize;
        self.explorer.hover(pills[self.pill_index]);
        self.reset_selection();
    }

    fn leave_pills(&mut self) {
        self.explorer.unhover();
        self.focus = Focus::Grid;
        self.reset_selection();
    }

    // ------------------------------------------------------------------------
    // Add flow
    // ------------------------------------------------------------------------

    fn submit_add(&mut self) {
        let url = self.explorer.add_flow().input().to_string();

        match self.explorer.begin_add(&url) {
            Ok(pending) => {
                self.message = None;
                let classifier = Arc::clone(&self.classifier);
                let tx = self.tx.clone();
                self.runtime.spawn(async move {
                    let result = classifier.classify(pending.url()).await;
                    // Receiver gone means the app quit; nothing to apply
                    let _ = tx.send((pending, result));
                });
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    /// Apply finished detections. Never blocks.
    pub fn poll_detections(&mut self) {
        while let Ok((pending, result)) = self.rx.try_recv() {
            match self.explorer.complete_add(pending, result) {
                Completion::Added(record) => {
                    self.message = Some(format!("Added {} ({})", record.name, record.provider));

                    // Search-as-add: the query was the domain, clear it
                    let query = self.explorer.filter().query.clone();
                    if normalize_domain(&query).ok().as_deref() == Some(record.domain.as_str()) {
                        self.explorer.set_query("");
                    }
                    self.reset_selection();
                }
                Completion::Failed(err) => self.message = Some(err.to_string()),
                Completion::Discarded => debug!("Dropped stale detection result"),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
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

    // Anything still detecting belongs to a view that is gone
    app.explorer.reset();

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.poll_detections();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if !app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn provider_color(provider: Provider) -> Color {
    let (r, g, b) = provider.rgb();
    Color::Rgb(r, g, b)
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title + headline
            Constraint::Length(3), // Search / add input
            Constraint::Length(3), // Provider pills
            Constraint::Min(0),    // Chart + grid
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_input(f, chunks[1], app);
    render_pills(f, chunks[2], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    render_chart(f, body[0], app);

    if app.show_detail {
        let grid_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body[1]);

        render_grid(f, grid_chunks[0], app);
        render_detail_panel(f, grid_chunks[1], app);
    } else {
        render_grid(f, body[1], app);
    }

    render_status_bar(f, chunks[4], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.explorer.stats();

    let header_text = vec![
        Line::from(vec![
            Span::styled(
                "Who Controls ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "The Internet?",
                Style::default()
                    .fg(Color::Rgb(0xf9, 0x73, 0x16))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::styled(
                format!(
                    "Total: {} ({} added)",
                    stats.total,
                    app.explorer.catalog().appended().len()
                ),
                Style::default().fg(Color::White),
            ),
            Span::raw("  |  "),
            Span::styled(
                format!("Big 3: {}%", stats.big_three_share),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "When AWS goes down, Netflix, Reddit, and Slack go with it.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let flow = app.explorer.add_flow();

    let (label, text, active) = match app.focus {
        Focus::AddUrl => ("Add URL: ", flow.input().to_string(), true),
        Focus::Search => ("Search: ", app.explorer.filter().query.clone(), true),
        _ if !app.explorer.filter().query.is_empty() => {
            ("Search: ", app.explorer.filter().query.clone(), false)
        }
        _ => (
            "",
            "Search companies (/) or add new ones (a), e.g. 'Netflix' or 'stripe.com'".to_string(),
            false,
        ),
    };

    let mut spans = vec![
        Span::styled(label, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(
            text,
            if active || !label.is_empty() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        ),
    ];
    if active {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    if app.focus == Focus::Search && app.explorer.should_offer_add() {
        spans.push(Span::styled(
            "   Enter to add as a new company",
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        ));
    }

    let border = if active { Color::Yellow } else { Color::White };
    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", app.focus.title())),
    );

    f.render_widget(input, area);
}

fn render_pills(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.explorer.stats();
    let filter = app.explorer.filter();

    // Terminals cannot load provider logos and an unloaded pill logo is
    // hidden, so pills are text only
    let mut spans = vec![];
    for (i, share) in stats.providers.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }

        let color = provider_color(share.provider);
        let selected = filter.selected_provider == Some(share.provider);
        let hovered = filter.hovered_provider == Some(share.provider);

        let mut style = if selected {
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        };
        if hovered {
            style = style.add_modifier(Modifier::UNDERLINED | Modifier::REVERSED);
        }

        spans.push(Span::styled(
            format!(" {} ({}) ", share.provider, share.count),
            style,
        ));
    }

    let border = if app.focus == Focus::Pills { Color::Yellow } else { Color::White };
    let pills = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Providers (Tab) "),
    );

    f.render_widget(pills, area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.explorer.stats();
    let filter = app.explorer.filter();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let bars: Vec<Bar> = stats
        .providers
        .iter()
        .map(|share| {
            let dimmed = match filter.focused_provider() {
                Some(focused) => focused != share.provider,
                None => false,
            };
            let color = if dimmed {
                Color::DarkGray
            } else {
                provider_color(share.provider)
            };

            Bar::default()
                .value(share.count as u64)
                .label(Line::from(share.provider.as_str()))
                .text_value(format!("{}%", share.percent))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Cloud Provider Market Share "),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1);

    f.render_widget(chart, chunks[0]);

    let share = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("  {}%", stats.big_three_share),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  The Big 3 Control Everything",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(share, chunks[1]);
}

fn render_grid(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Company", "Symbol", "Domain", "Provider"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let visible = app.explorer.visible();
    let count = visible.len();

    let rows: Vec<Row> = visible
        .iter()
        .map(|company| {
            let color = provider_color(company.provider);

            // No image loads in a terminal: the chain is exhausted and the
            // grid falls back to local initials
            let logo = match resolve(&company_logo_chain(company), |_| false) {
                Some(candidate) => candidate.url.clone(),
                None => initials(&company.name),
            };

            let cells = vec![
                Cell::from(format!("[{:^2}]", logo)).style(Style::default().fg(color)),
                Cell::from(truncate(&company.name, 24)),
                Cell::from(company.symbol.clone()),
                Cell::from(truncate(&company.domain, 24)),
                Cell::from(company.provider.as_str()).style(Style::default().fg(color)),
            ];

            Row::new(cells).height(1)
        })
        .collect();

    let title = format!(" {} ({}) ", app.explorer.heading(), count);

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(26),
            Constraint::Length(8),
            Constraint::Length(26),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let company = match app.selected_company() {
        Some(c) => c,
        None => {
            let no_selection = Paragraph::new("No company selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Company Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Name: ", label), Span::raw(company.name.clone())]),
        Line::from(vec![Span::styled("  Symbol: ", label), Span::raw(company.symbol.clone())]),
        Line::from(vec![Span::styled("  Domain: ", label), Span::raw(company.domain.clone())]),
        Line::from(vec![
            Span::styled("  Provider: ", label),
            Span::styled(
                company.provider.as_str(),
                Style::default().fg(provider_color(company.provider)),
            ),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(Span::styled(
            "  LOGO SOURCES",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(""),
    ];

    for (i, candidate) in company_logo_chain(company).iter().enumerate() {
        content.push(Line::from(vec![
            Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::Yellow)),
            Span::styled(
                truncate(&candidate.url, area.width.saturating_sub(8) as usize),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    content.push(Line::from(vec![
        Span::styled("  fallback: ", Style::default().fg(Color::Yellow)),
        Span::raw(initials(&company.name)),
    ]));

    if company.is_custom() {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            "  Added this session",
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        )));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Company Details "),
    );

    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.visible_len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    match app.explorer.add_flow().state() {
        AddFlowState::Detecting { domain } => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                format!("Detecting cloud provider for {}...", domain),
                Style::default().fg(Color::Yellow),
            ));
        }
        AddFlowState::Failed(err) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(err.to_string(), Style::default().fg(Color::Red)));
        }
        AddFlowState::Idle => {
            if let Some(msg) = &app.message {
                status_spans.push(Span::raw(" | "));
                status_spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Green)));
            }
        }
    }

    let hints: &[(&str, &str)] = match app.focus {
        Focus::Grid => &[
            ("/", "Search"),
            ("a", "Add"),
            ("Tab", "Providers"),
            ("c", "Clear"),
            ("Enter", "Details"),
            ("q", "Quit"),
        ],
        Focus::Search => &[("Enter", "Done / Add domain"), ("Esc", "Back")],
        Focus::AddUrl => &[("Enter", "Detect"), ("Esc", "Back")],
        Focus::Pills => &[("←/→", "Hover"), ("Enter", "Select"), ("Esc", "Back")],
    };

    for (key, action) in hints {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {}", action)));
    }

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
