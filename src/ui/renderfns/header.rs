use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::ShortcutInfo;

/// Draw the header bar with logo, repository and the current view's shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, shortcuts: &[ShortcutInfo]) {
  let mut spans = vec![
    Span::styled(" gh9s ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Yellow).bold()),
    Span::raw(" "),
  ];

  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);
  for shortcut in sorted {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Draw the footer bar with view breadcrumb
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String]) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.clone(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;

  fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
      .map(|x| buffer[(x, y)].symbol())
      .collect()
  }

  #[test]
  fn test_header_lists_shortcuts_by_priority() {
    let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
    let shortcuts = [
      ShortcutInfo::new("q", "back").with_priority(30),
      ShortcutInfo::new(":", "command").with_priority(10),
    ];
    terminal
      .draw(|frame| {
        let area = frame.area();
        draw_header(frame, area, "rust-lang/rust", &shortcuts);
      })
      .unwrap();

    let text = row_text(&terminal, 0);
    assert!(text.contains("gh9s"));
    assert!(text.contains("rust-lang/rust"));
    let command = text.find("<:>").unwrap();
    let back = text.find("<q>").unwrap();
    assert!(command < back);
  }

  #[test]
  fn test_footer_joins_breadcrumb() {
    let mut terminal = Terminal::new(TestBackend::new(40, 1)).unwrap();
    let breadcrumb = vec!["Issues [All]".to_string(), "#42".to_string()];
    terminal
      .draw(|frame| {
        let area = frame.area();
        draw_footer(frame, area, &breadcrumb);
      })
      .unwrap();

    assert!(row_text(&terminal, 0).contains("Issues [All] > #42"));
  }
}
