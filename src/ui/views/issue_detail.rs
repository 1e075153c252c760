use crate::github::types::{Comment, Issue};
use crate::github::{GithubCache, IssueSource};
use crate::queries::detail::{comments_query, issue_query};
use crate::query::{Query, QueryState};
use crate::ui::renderfns::{label_color, state_color, state_icon, time_since};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// View for a single issue and its comments.
///
/// Shows whatever the cache holds for the issue right away, which after a
/// hover is the list row's partial issue, and swaps in the full issue once it
/// lands.
pub struct IssueDetailView {
  number: u64,
  issue: Query<Issue>,
  comments: Query<Vec<Comment>>,
  scroll: u16,
}

impl IssueDetailView {
  pub fn new<S: IssueSource>(cache: &GithubCache, source: &S, number: u64) -> Self {
    let mut issue = issue_query(cache, source, number);
    let mut comments = comments_query(cache, source, number);

    // Start fetching immediately; both are no-ops when primed data is fresh
    issue.fetch();
    comments.fetch();

    Self {
      number,
      issue,
      comments,
      scroll: 0,
    }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.issue.state() {
      QueryState::Loading => format!(" #{} (loading...) ", self.number),
      QueryState::Error(e) => format!(" #{} (error: {}) ", self.number, e),
      _ if self.issue.is_fetching() => format!(" #{} (refreshing...) ", self.number),
      _ => match self.issue.last_error() {
        Some(e) => format!(" #{} (refresh failed: {}) ", self.number, e),
        None => format!(" #{} ", self.number),
      },
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if self.issue.is_loading() {
      let paragraph =
        Paragraph::new("Loading issue details...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    if let Some(error) = self.issue.error() {
      let paragraph = Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", error))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let Some(issue) = self.issue.data() else {
      return;
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Title, metadata, labels
        Constraint::Length(1), // Separator
        Constraint::Min(1),    // Body and comments
      ])
      .split(inner);

    let now = Utc::now();
    frame.render_widget(Paragraph::new(header_lines(issue, now)), chunks[0]);

    let sep = Paragraph::new("─".repeat(chunks[1].width as usize))
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, chunks[1]);

    let mut lines = self.body_lines(issue);
    lines.push(Line::raw(""));
    lines.extend(self.comment_lines(now));

    let body = Paragraph::new(lines)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(body, chunks[2]);
  }

  fn body_lines(&self, issue: &Issue) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    match issue.body.as_deref() {
      Some(body) if !body.trim().is_empty() => {
        body.lines().map(|l| Line::raw(l.to_string())).collect()
      }
      // List rows carry no body; the full issue is on its way
      None if self.issue.is_fetching() => vec![Line::styled("Loading description...", dim)],
      None => match self.issue.last_error() {
        Some(e) => vec![
          Line::styled(format!("Description unavailable: {}", e), Style::default().fg(Color::Red)),
          Line::styled("Press 'r' to retry.", dim),
        ],
        None => vec![Line::styled("No description provided.", dim)],
      },
      _ => vec![Line::styled("No description provided.", dim)],
    }
  }

  fn comment_lines(&self, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let heading = Style::default().fg(Color::Yellow).bold();
    let dim = Style::default().fg(Color::DarkGray);

    let comments = match self.comments.state() {
      QueryState::Idle | QueryState::Loading => {
        return vec![Line::styled("Loading comments...", dim)];
      }
      QueryState::Error(e) => {
        return vec![Line::styled(
          format!("Failed to load comments: {}", e),
          Style::default().fg(Color::Red),
        )];
      }
      QueryState::Success(comments) => comments,
    };

    let mut lines = vec![Line::styled(format!("Comments ({})", comments.len()), heading)];
    for comment in comments {
      lines.push(Line::raw(""));
      lines.push(Line::from(vec![
        Span::styled(comment.user.login.clone(), Style::default().fg(Color::Cyan)),
        Span::styled(format!(" commented {}", time_since(comment.created_at, now)), dim),
      ]));
      lines.extend(comment.body.lines().map(|l| Line::raw(format!("  {}", l))));
    }
    lines
  }
}

fn header_lines(issue: &Issue, now: DateTime<Utc>) -> Vec<Line<'static>> {
  let dim = Style::default().fg(Color::DarkGray);
  let state = Style::default().fg(state_color(issue.state));

  let mut labels = Vec::new();
  for label in &issue.labels {
    labels.push(Span::styled(
      format!("[{}]", label.name),
      Style::default().fg(label_color(&label.color)),
    ));
    labels.push(Span::raw(" "));
  }

  vec![
    Line::from(Span::styled(issue.title.clone(), Style::default().bold())),
    Line::from(vec![
      Span::styled(format!("{} {:?}", state_icon(issue.state), issue.state), state),
      Span::styled(
        format!(
          "  #{} opened {} by {} · {} comments",
          issue.number,
          time_since(issue.created_at, now),
          issue.user.login,
          issue.comments
        ),
        dim,
      ),
    ]),
    Line::from(labels),
  ]
}

impl View for IssueDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        ViewAction::None
      }
      KeyCode::Char('r') => {
        self.issue.refetch();
        self.comments.refetch();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn handle_mouse(&mut self, mouse: MouseEvent) -> ViewAction {
    match mouse.kind {
      MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
      MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("#{}", self.number)
  }

  fn tick(&mut self) {
    self.issue.poll();
    self.issue.refresh_if_stale();
    self.comments.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
