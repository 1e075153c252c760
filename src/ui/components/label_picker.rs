use super::KeyResult;
use crate::github::types::Label;
use crate::queries::IssueFilter;
use crate::ui::renderfns::label_color;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Events emitted by the label picker that the parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelPickerEvent {
  /// Label toggled in or out of the filter (label name)
  Toggled(String),
  Closed,
}

/// Overlay for selecting any number of labels.
///
/// The picker only owns its cursor; labels and the current selection are
/// passed in by the parent so they always reflect the latest query data.
#[derive(Debug, Clone, Default)]
pub struct LabelPicker {
  active: bool,
  cursor: usize,
}

impl LabelPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self) {
    self.active = true;
    self.cursor = 0;
  }

  pub fn hide(&mut self) {
    self.active = false;
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn handle_key(&mut self, key: KeyEvent, labels: &[Label]) -> KeyResult<LabelPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('l') => {
        self.hide();
        KeyResult::Event(LabelPickerEvent::Closed)
      }
      KeyCode::Enter | KeyCode::Char(' ') => match labels.get(self.cursor) {
        Some(label) => KeyResult::Event(LabelPickerEvent::Toggled(label.name.clone())),
        None => KeyResult::Handled,
      },
      KeyCode::Char('j') | KeyCode::Down => {
        if !labels.is_empty() {
          self.cursor = (self.cursor + 1) % labels.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !labels.is_empty() {
          self.cursor = if self.cursor == 0 {
            labels.len() - 1
          } else {
            self.cursor - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active.
  ///
  /// `labels` is `None` while the labels are still loading.
  pub fn render_overlay(
    &self,
    frame: &mut Frame,
    area: Rect,
    labels: Option<&[Label]>,
    filter: &IssueFilter,
  ) {
    if !self.active {
      return;
    }

    let count = labels.map(|l| l.len()).unwrap_or(1).max(1);
    let longest = labels
      .and_then(|l| l.iter().map(|label| label.name.chars().count()).max())
      .unwrap_or(10);
    let width = (longest as u16 + 10).clamp(24, area.width.max(24)).min(area.width);
    let height = (count as u16 + 2).min(area.height);

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Labels ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let labels = match labels {
      Some(labels) if !labels.is_empty() => labels,
      Some(_) => {
        frame.render_widget(
          Paragraph::new("No labels").style(Style::default().fg(Color::DarkGray)),
          inner,
        );
        return;
      }
      None => {
        frame.render_widget(
          Paragraph::new("Loading labels...").style(Style::default().fg(Color::DarkGray)),
          inner,
        );
        return;
      }
    };

    let items: Vec<ListItem> = labels
      .iter()
      .map(|label| {
        let mark = if filter.is_selected(&label.name) {
          "[x] "
        } else {
          "[ ] "
        };
        ListItem::new(Line::from(vec![
          Span::styled(mark, Style::default().fg(Color::Yellow)),
          Span::styled(
            label.name.as_str(),
            Style::default().fg(label_color(&label.color)),
          ),
        ]))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(self.cursor.min(labels.len() - 1)));
    frame.render_stateful_widget(list, inner, &mut state);
  }
}
