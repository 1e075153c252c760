use crate::config::ListMode;
use crate::github::types::{Issue, Label, StateFilter};
use crate::github::{GithubCache, IssueSource};
use crate::queries::labels::labels_query;
use crate::queries::{prime_issue, InfiniteIssues, IssueFilter, PagedIssues};
use crate::query::Query;
use crate::ui::components::{draw_state_tabs, KeyResult, LabelPicker, LabelPickerEvent};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{label_color, state_color, state_icon, time_since, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::IssueDetailView;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// The two ways of walking through the issue list
enum IssueList<S: IssueSource> {
  Paged(PagedIssues<S>),
  Infinite(InfiniteIssues<S>),
}

impl<S: IssueSource> IssueList<S> {
  fn new(mode: ListMode, source: S, cache: GithubCache) -> Self {
    match mode {
      ListMode::Paged => IssueList::Paged(PagedIssues::new(source, cache, IssueFilter::default())),
      ListMode::Infinite => {
        IssueList::Infinite(InfiniteIssues::new(source, cache, IssueFilter::default()))
      }
    }
  }

  fn issues(&self) -> &[Issue] {
    match self {
      IssueList::Paged(list) => list.issues(),
      IssueList::Infinite(list) => list.issues(),
    }
  }

  fn filter(&self) -> &IssueFilter {
    match self {
      IssueList::Paged(list) => list.filter(),
      IssueList::Infinite(list) => list.filter(),
    }
  }

  fn set_state(&mut self, state: StateFilter) {
    match self {
      IssueList::Paged(list) => list.set_state(state),
      IssueList::Infinite(list) => list.set_state(state),
    }
  }

  fn toggle_label(&mut self, name: &str) {
    match self {
      IssueList::Paged(list) => list.toggle_label(name),
      IssueList::Infinite(list) => list.toggle_label(name),
    }
  }

  fn refetch(&mut self) {
    match self {
      IssueList::Paged(list) => list.refetch(),
      IssueList::Infinite(list) => list.refetch(),
    }
  }

  fn poll(&mut self) -> bool {
    match self {
      IssueList::Paged(list) => list.poll(),
      IssueList::Infinite(list) => list.poll(),
    }
  }

  fn is_loading(&self) -> bool {
    match self {
      IssueList::Paged(list) => list.query().is_loading(),
      IssueList::Infinite(list) => list.query().is_loading(),
    }
  }

  fn is_fetching(&self) -> bool {
    match self {
      IssueList::Paged(list) => list.query().is_fetching(),
      IssueList::Infinite(list) => list.query().is_fetching(),
    }
  }

  fn error(&self) -> Option<&str> {
    match self {
      IssueList::Paged(list) => list.query().last_error(),
      IssueList::Infinite(list) => list.query().last_error(),
    }
  }
}

/// View for browsing the repository's issues
pub struct IssueListView<S: IssueSource> {
  source: S,
  cache: GithubCache,
  list: IssueList<S>,
  labels: Query<Vec<Label>>,
  list_state: ListState,
  picker: LabelPicker,
  /// Last drawn list area, for mapping mouse positions to rows
  list_area: Rect,
  /// Issue number primed most recently
  primed: Option<u64>,
}

impl<S: IssueSource> IssueListView<S> {
  pub fn new(mode: ListMode, source: S, cache: GithubCache) -> Self {
    Self {
      list: IssueList::new(mode, source.clone(), cache.clone()),
      labels: labels_query(&cache, &source),
      source,
      cache,
      list_state: ListState::default(),
      picker: LabelPicker::new(),
      list_area: Rect::default(),
      primed: None,
    }
  }

  fn issues(&self) -> &[Issue] {
    self.list.issues()
  }

  fn selected_issue(&self) -> Option<&Issue> {
    self.list_state.selected().and_then(|idx| self.issues().get(idx))
  }

  /// Warm the cache for the issue at `idx`, once per highlighted issue
  fn prime(&mut self, idx: usize) {
    let Some(issue) = self.list.issues().get(idx) else {
      return;
    };
    if self.primed == Some(issue.number) {
      return;
    }
    self.primed = Some(issue.number);
    prime_issue(&self.cache, &self.source, issue);
  }

  fn prime_selected(&mut self) {
    if let Some(idx) = self.list_state.selected() {
      self.prime(idx);
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.issues().len();
    if len == 0 {
      return;
    }

    let current = self.list_state.selected().unwrap_or(0);
    if delta > 0 && current + 1 >= len {
      // Moving past the last row asks for more
      if let IssueList::Infinite(list) = &mut self.list {
        list.fetch_next_page();
      }
      return;
    }

    let next = (current as i64 + delta as i64).clamp(0, len as i64 - 1) as usize;
    self.list_state.select(Some(next));
    self.prime_selected();
  }

  /// Filters changed: the rows on screen belong to another list now
  fn reset_selection(&mut self) {
    self.list_state = ListState::default();
    self.primed = None;
  }

  /// Row index under a terminal position, if it is on a list row
  fn row_at(&self, column: u16, row: u16) -> Option<usize> {
    let inner = Block::default().borders(Borders::ALL).inner(self.list_area);
    let inside = column >= inner.x
      && column < inner.x + inner.width
      && row >= inner.y
      && row < inner.y + inner.height;
    if !inside {
      return None;
    }
    let idx = self.list_state.offset() + (row - inner.y) as usize;
    (idx < self.issues().len()).then_some(idx)
  }

  fn title(&self) -> String {
    let filter = self.list.filter().describe();
    let count = self.issues().len();
    let position = match &self.list {
      IssueList::Paged(list) => format!(" page {}", list.page()),
      IssueList::Infinite(list) => format!(" {} pages", list.page_count()),
    };
    let status = if self.list.is_loading() {
      " (loading...)"
    } else if self.list.is_fetching() {
      " (refreshing...)"
    } else {
      ""
    };
    format!(" Issues [{}] ({}){}{} ", filter, count, position, status)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    self.list_area = area;
    let len = self.issues().len();
    ensure_valid_selection(&mut self.list_state, len);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let content = if self.list.is_loading() {
        "Loading issues...".to_string()
      } else if let Some(error) = self.list.error() {
        format!("Failed to load issues: {}\n\nPress 'r' to retry.", error)
      } else {
        "No issues found.".to_string()
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = self
      .issues()
      .iter()
      .map(|issue| ListItem::new(issue_line(issue, now)))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let hint = Style::default().fg(Color::DarkGray);
    let key = Style::default().fg(Color::Cyan);

    let spans = match &self.list {
      IssueList::Paged(list) => vec![
        Span::styled(format!(" Page {} ", list.page()), Style::default().fg(Color::Yellow)),
        Span::styled(" <p>", key),
        Span::styled(" previous ", hint),
        Span::styled(" <n>", key),
        Span::styled(" next", hint),
      ],
      IssueList::Infinite(list) if list.is_fetching_next_page() => {
        vec![Span::styled(" Loading more...", Style::default().fg(Color::Yellow))]
      }
      IssueList::Infinite(list) if list.has_next_page() => {
        vec![Span::styled(" <m>", key), Span::styled(" load more", hint)]
      }
      IssueList::Infinite(list) if list.page_count() > 0 => {
        vec![Span::styled(" No more issues", hint)]
      }
      IssueList::Infinite(_) => Vec::new(),
    };

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

/// One row: state, number, title, labels, then age, author and comment count
fn issue_line(issue: &Issue, now: chrono::DateTime<Utc>) -> Line<'static> {
  let dim = Style::default().fg(Color::DarkGray);
  let mut spans = vec![
    Span::styled(
      format!("{} ", state_icon(issue.state)),
      Style::default().fg(state_color(issue.state)),
    ),
    Span::styled(format!("#{:<6}", issue.number), Style::default().fg(Color::Cyan)),
    Span::raw(truncate(&issue.title, 60)),
  ];

  for label in &issue.labels {
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
      format!("[{}]", label.name),
      Style::default().fg(label_color(&label.color)),
    ));
  }

  spans.push(Span::styled(
    format!(
      "  opened {} by {} · {} comments",
      time_since(issue.created_at, now),
      issue.user.login,
      issue.comments
    ),
    dim,
  ));
  Line::from(spans)
}

impl<S: IssueSource> View for IssueListView<S> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let labels = self.labels.data().map(Vec::as_slice).unwrap_or(&[]);
    match self.picker.handle_key(key, labels) {
      KeyResult::Event(LabelPickerEvent::Toggled(name)) => {
        self.list.toggle_label(&name);
        self.reset_selection();
        return ViewAction::None;
      }
      KeyResult::Event(LabelPickerEvent::Closed) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char('s') => {
        let next = self.list.filter().state.cycle();
        self.list.set_state(next);
        self.reset_selection();
      }
      KeyCode::Char('l') => {
        self.labels.fetch();
        self.picker.show();
      }
      KeyCode::Char('n') => {
        if let IssueList::Paged(list) = &mut self.list {
          if list.next() {
            self.reset_selection();
          }
        }
      }
      KeyCode::Char('p') => {
        if let IssueList::Paged(list) = &mut self.list {
          if list.previous() {
            self.reset_selection();
          }
        }
      }
      KeyCode::Char('m') => {
        if let IssueList::Infinite(list) = &mut self.list {
          list.fetch_next_page();
        }
      }
      KeyCode::Char('r') => self.list.refetch(),
      KeyCode::Enter => {
        if let Some(issue) = self.selected_issue() {
          return ViewAction::Push(Box::new(IssueDetailView::new(
            &self.cache,
            &self.source,
            issue.number,
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn handle_mouse(&mut self, mouse: MouseEvent) -> ViewAction {
    if self.picker.is_active() {
      return ViewAction::None;
    }

    match mouse.kind {
      MouseEventKind::Moved => {
        if let Some(idx) = self.row_at(mouse.column, mouse.row) {
          self.prime(idx);
        }
      }
      MouseEventKind::Down(MouseButton::Left) => {
        if let Some(idx) = self.row_at(mouse.column, mouse.row) {
          self.list_state.select(Some(idx));
          self.prime(idx);
        }
      }
      MouseEventKind::ScrollDown => self.move_selection(1),
      MouseEventKind::ScrollUp => self.move_selection(-1),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // State tabs
        Constraint::Min(1),    // Issues
        Constraint::Length(1), // Paging
      ])
      .split(area);

    let filter = self.list.filter();
    let selected: Vec<&str> = filter.labels.iter().map(String::as_str).collect();
    draw_state_tabs(frame, chunks[0], filter.state, &selected);

    self.render_list(frame, chunks[1]);
    self.render_status(frame, chunks[2]);

    self.picker.render_overlay(
      frame,
      area,
      self.labels.data().map(Vec::as_slice),
      self.list.filter(),
    );
  }

  fn breadcrumb_label(&self) -> String {
    let mode = match self.list {
      IssueList::Paged(_) => "",
      IssueList::Infinite(_) => " (infinite)",
    };
    format!("Issues [{}]{}", self.list.filter().describe(), mode)
  }

  fn tick(&mut self) {
    if self.list.poll() {
      ensure_valid_selection(&mut self.list_state, self.list.issues().len());
      self.prime_selected();
    }
    self.labels.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("s", "state").with_priority(20),
      ShortcutInfo::new("l", "labels").with_priority(21),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("enter", "open").with_priority(50),
    ];
    match self.list {
      IssueList::Paged(_) => {
        shortcuts.push(ShortcutInfo::new("n/p", "page").with_priority(30));
      }
      IssueList::Infinite(_) => {
        shortcuts.push(ShortcutInfo::new("m", "more").with_priority(30));
      }
    }
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::github::GithubQueryKey;
  use crate::queries::fake::FakeSource;
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent {
      kind,
      column,
      row,
      modifiers: KeyModifiers::NONE,
    }
  }

  async fn settle<S: IssueSource>(view: &mut IssueListView<S>) {
    tokio::time::sleep(Duration::from_millis(10)).await;
    view.tick();
  }

  fn render<S: IssueSource>(view: &mut IssueListView<S>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
    terminal
      .draw(|frame| {
        let area = frame.area();
        view.render(frame, area);
      })
      .unwrap();
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
      .map(|y| {
        (0..buffer.area.width)
          .map(|x| buffer[(x, y)].symbol())
          .collect::<String>()
      })
      .collect::<Vec<_>>()
      .join("\n")
  }

  fn is_seeded(cache: &GithubCache, number: u64) -> bool {
    cache
      .get::<Issue>(&GithubQueryKey::Issue { number })
      .is_some()
  }

  #[tokio::test(start_paused = true)]
  async fn test_renders_loaded_rows() {
    let source = FakeSource::new(3, 1);
    let mut view = IssueListView::new(ListMode::Paged, source, GithubCache::new());
    assert!(render(&mut view).contains("Loading issues..."));

    settle(&mut view).await;
    let screen = render(&mut view);
    assert!(screen.contains("#1"));
    assert!(screen.contains("Issue 3"));
    assert!(screen.contains("Page 1"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_selection_primes_issue() {
    let source = FakeSource::new(3, 1);
    let cache = GithubCache::new();
    let mut view = IssueListView::new(ListMode::Paged, source, cache.clone());
    settle(&mut view).await;

    // First row is highlighted as soon as data arrives
    assert!(is_seeded(&cache, 1));
    assert!(!is_seeded(&cache, 2));

    view.handle_key(key(KeyCode::Down));
    assert!(is_seeded(&cache, 2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_mouse_hover_primes_row_under_pointer() {
    let source = FakeSource::new(5, 1);
    let cache = GithubCache::new();
    let mut view = IssueListView::new(ListMode::Paged, source.clone(), cache.clone());
    settle(&mut view).await;
    render(&mut view);

    // Tabs on row 0, list border on row 1, first issue on row 2
    view.handle_mouse(mouse(MouseEventKind::Moved, 10, 5));
    assert!(is_seeded(&cache, 4));
    assert_eq!(view.list_state.selected(), Some(0));

    // Border rows are not issues
    view.handle_mouse(mouse(MouseEventKind::Moved, 10, 1));
    assert_eq!(view.primed, Some(4));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(source.issue_calls(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_state_key_cycles_filter_and_resets_page() {
    let source = FakeSource::new(3, 3);
    let mut view = IssueListView::new(ListMode::Paged, source.clone(), GithubCache::new());
    settle(&mut view).await;
    view.handle_key(key(KeyCode::Char('n')));
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('s')));
    settle(&mut view).await;

    assert_eq!(view.list.filter().state, StateFilter::Open);
    let (filter, page) = source.requests().pop().unwrap();
    assert_eq!(filter.state, StateFilter::Open);
    assert_eq!(page, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_label_picker_toggles_filter() {
    let source = FakeSource::new(3, 1);
    let mut view = IssueListView::new(ListMode::Infinite, source.clone(), GithubCache::new());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('l')));
    settle(&mut view).await;
    view.handle_key(key(KeyCode::Enter));
    assert!(view.list.filter().is_selected("bug"));

    view.handle_key(key(KeyCode::Esc));
    assert!(!view.picker.is_active());
    settle(&mut view).await;

    let (filter, _) = source.requests().pop().unwrap();
    assert!(filter.is_selected("bug"));
    assert_eq!(view.breadcrumb_label(), "Issues [All + bug] (infinite)");
  }

  #[tokio::test(start_paused = true)]
  async fn test_moving_past_last_row_loads_more() {
    let source = FakeSource::new(2, 3);
    let mut view = IssueListView::new(ListMode::Infinite, source.clone(), GithubCache::new());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Down));
    view.handle_key(key(KeyCode::Down));
    settle(&mut view).await;

    assert_eq!(view.issues().len(), 4);
    assert_eq!(source.requested_pages(), vec![1, 2]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_enter_opens_detail() {
    let source = FakeSource::new(3, 1);
    let mut view = IssueListView::new(ListMode::Paged, source, GithubCache::new());
    settle(&mut view).await;

    let action = view.handle_key(key(KeyCode::Enter));
    match action {
      ViewAction::Push(detail) => assert_eq!(detail.breadcrumb_label(), "#1"),
      _ => panic!("expected the detail view to be pushed"),
    }
  }
}
