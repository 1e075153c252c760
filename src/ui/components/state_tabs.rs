use crate::github::types::StateFilter;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// One-line tab strip for the issue state filter, with the selected labels
/// listed after the tabs.
pub fn draw_state_tabs(frame: &mut Frame, area: Rect, current: StateFilter, labels: &[&str]) {
  let mut spans = vec![Span::styled("[state] ", Style::default().fg(Color::Yellow))];

  for (idx, state) in StateFilter::all_variants().iter().enumerate() {
    if idx > 0 {
      spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    }
    let style = if *state == current {
      Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled(format!(" {} ", state.label()), style));
  }

  if !labels.is_empty() {
    spans.push(Span::styled("   [labels] ", Style::default().fg(Color::Yellow)));
    spans.push(Span::styled(labels.join(", "), Style::default().fg(Color::White)));
  }

  frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
