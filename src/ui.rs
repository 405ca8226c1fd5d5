use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::{
    summarize, Category, ExpenseFilter, ExpenseStore, KeyValueStore, StoredExpense, Summary,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Ledger,
    Summary,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Ledger => Page::Summary,
            Page::Summary => Page::Ledger,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Ledger => "Expenses",
            Page::Summary => "Summary",
        }
    }
}

pub struct App {
    pub expenses: Vec<StoredExpense>,
    pub filtered_expenses: Vec<StoredExpense>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub active_category: Option<Category>,
    pub status: Option<String>,
}

impl App {
    pub fn new(expenses: Vec<StoredExpense>) -> Self {
        let mut app = Self {
            expenses: Vec::new(),
            filtered_expenses: Vec::new(),
            state: TableState::default(),
            current_page: Page::Ledger,
            show_detail: false,
            active_category: None,
            status: None,
        };
        app.reload(expenses);
        app
    }

    /// Replace the expense list, keeping the active filter and selection row
    pub fn reload(&mut self, expenses: Vec<StoredExpense>) {
        let previous = self.state.selected();
        self.expenses = expenses;
        self.refilter();

        let len = self.filtered_expenses.len();
        let selected = match (previous, len) {
            (_, 0) => None,
            (Some(i), _) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.state.select(selected);
    }

    fn refilter(&mut self) {
        let criteria = match self.active_category {
            Some(category) => ExpenseFilter::default().category(category.code()),
            None => ExpenseFilter::default(),
        };

        self.filtered_expenses = self
            .expenses
            .iter()
            .filter(|stored| criteria.matches(&stored.expense))
            .cloned()
            .collect();
    }

    pub fn apply_category(&mut self, category: Option<Category>) {
        self.active_category = category;
        self.refilter();

        // Reset selection to first item
        if !self.filtered_expenses.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_expense(&self) -> Option<&StoredExpense> {
        self.state.selected().and_then(|i| self.filtered_expenses.get(i))
    }

    pub fn next(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.filtered_expenses)
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App, store: &mut ExpenseStore<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, store);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut ExpenseStore<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            app.status = None;

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Char('c') | KeyCode::Char('0') => app.apply_category(None),
                KeyCode::Char(code @ '1'..='5') => {
                    app.apply_category(Category::from_code(&code.to_string()));
                }
                KeyCode::Char('d') | KeyCode::Delete => {
                    if let Some(id) = app.selected_expense().map(|stored| stored.id) {
                        store.delete(id)?;
                        app.reload(store.list_all()?);
                        app.status = Some(format!("Deleted expense {}", id));
                    }
                }
                KeyCode::Char('r') => app.reload(store.list_all()?),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => {
                    if !app.filtered_expenses.is_empty() {
                        app.state.select(Some(0));
                    }
                }
                KeyCode::End => {
                    if !app.filtered_expenses.is_empty() {
                        app.state.select(Some(app.filtered_expenses.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Ledger if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Ledger => render_table(f, chunks[1], app),
        Page::Summary => render_summary(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.summary();

    let mut tab_spans = vec![];
    for (i, page) in [Page::Ledger, Page::Summary].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Shown: {}/{}", app.filtered_expenses.len(), app.expenses.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {:.2}", summary.total),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn category_color(code: &str) -> Color {
    match Category::from_code(code) {
        Some(Category::Food) => Color::Yellow,
        Some(Category::Education) => Color::Cyan,
        Some(Category::Leisure) => Color::Magenta,
        Some(Category::Health) => Color::Green,
        Some(Category::Transport) => Color::Blue,
        None => Color::White,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Id", "Date", "Category", "Description", "Amount"]
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

    let rows = app.filtered_expenses.iter().map(|stored| {
        let expense = &stored.expense;
        let color = category_color(&expense.category);

        Row::new(vec![
            Cell::from(stored.id.to_string()),
            Cell::from(expense.display_date()),
            Cell::from(expense.category_label().to_string()).style(Style::default().fg(color)),
            Cell::from(truncate(&expense.description, 40)),
            Cell::from(expense.amount.clone()),
        ])
        .height(1)
    });

    let title = match app.active_category {
        Some(category) => format!(" Expenses - {} ", category.label()),
        None => " Expenses ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(42),
            Constraint::Length(12),
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

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.summary();

    let header = Row::new(["Code", "Category", "Expenses", "Total"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .style(Style::default().bg(Color::DarkGray));

    let rows = summary.by_category.iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.code.clone()),
            Cell::from(entry.label.clone()).style(Style::default().fg(category_color(&entry.code))),
            Cell::from(entry.count.to_string()),
            Cell::from(format!("{:.2}", entry.total)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Summary - {} expenses, {:.2} total ",
                summary.count, summary.total
            )),
    );

    f.render_widget(table, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Expense Details ");

    let stored = match app.selected_expense() {
        Some(stored) => stored,
        None => {
            f.render_widget(Paragraph::new("No expense selected").block(block), area);
            return;
        }
    };
    let expense = &stored.expense;

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let weekday = expense
        .date()
        .map(|date| date.format("%A").to_string())
        .unwrap_or_else(|| "not a calendar date".to_string());

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Id: ", label),
            Span::raw(stored.id.to_string()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Date: ", label),
            Span::raw(expense.display_date()),
            Span::styled(format!(" ({})", weekday), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Category: ", label),
            Span::styled(
                expense.category_label().to_string(),
                Style::default().fg(category_color(&expense.category)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount: ", label),
            Span::raw(expense.amount.clone()),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("  Description: ", label)]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                expense.description.clone(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close, d to delete",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_expenses.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }

    let key = Style::default().fg(Color::Yellow);
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("1-5", key));
    status_spans.push(Span::raw(" Category | "));
    status_spans.push(Span::styled("c", key));
    status_spans.push(Span::raw(" Clear | "));
    status_spans.push(Span::styled("d", key));
    status_spans.push(Span::raw(" Delete | "));
    status_spans.push(Span::styled("Enter", key));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", key));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
