use crate::config::{Config, ListMode};
use crate::event::{Event, EventHandler};
use crate::github::{GithubActions, GithubCache};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::IssueListView;
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{
  DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers, MouseEvent,
};
use crossterm::execute;
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command mode (`:`) input and autocomplete
  command: CommandInput,

  /// Header title, "owner/repo" unless configured
  title: String,

  source: GithubActions,

  /// Query cache shared by every view
  cache: GithubCache,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let source = GithubActions::new(&config)?;
    let cache = GithubCache::new();
    let title = config.title.clone().unwrap_or_else(|| config.repo_slug());

    let root = root_view(config.list_mode, &source, &cache);

    Ok(Self {
      view_stack: vec![root],
      command: CommandInput::new(),
      title,
      source,
      cache,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = self.event_loop(&mut terminal).await;
    restore_terminal(&mut terminal)?;
    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal
        .draw(|frame| ui::draw(frame, self))
        .map_err(|e| eyre!("Failed to draw frame: {}", e))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Mouse(mouse) => self.handle_mouse(mouse),
      Event::Tick => {
        if let Some(view) = self.view_stack.last_mut() {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(&cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn handle_mouse(&mut self, mouse: MouseEvent) {
    if self.command.is_active() {
      return;
    }
    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_mouse(mouse),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "issues" => self.replace_root(ListMode::Paged),
      "infinite" => self.replace_root(ListMode::Infinite),
      "quit" => self.should_quit = true,
      other => warn!(command = other, "unknown command"),
    }
  }

  fn replace_root(&mut self, mode: ListMode) {
    info!(?mode, "switching issue list");
    self.view_stack.clear();
    self
      .view_stack
      .push(root_view(mode, &self.source, &self.cache));
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}

fn root_view(mode: ListMode, source: &GithubActions, cache: &GithubCache) -> Box<dyn View> {
  Box::new(IssueListView::new(mode, source.clone(), cache.clone()))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
  enable_raw_mode().map_err(|e| eyre!("Failed to enable raw mode: {}", e))?;
  execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)
    .map_err(|e| eyre!("Failed to enter alternate screen: {}", e))?;
  Terminal::new(CrosstermBackend::new(stdout()))
    .map_err(|e| eyre!("Failed to create terminal: {}", e))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
  disable_raw_mode().map_err(|e| eyre!("Failed to disable raw mode: {}", e))?;
  execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)
    .map_err(|e| eyre!("Failed to leave alternate screen: {}", e))?;
  terminal
    .show_cursor()
    .map_err(|e| eyre!("Failed to show cursor: {}", e))
}
