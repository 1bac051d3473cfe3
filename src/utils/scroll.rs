use ratatui::text::Line;
use unicode_width::UnicodeWidthStr;

/// Scroll math for the transcript pane.
///
/// The renderer lets ratatui wrap long lines; these helpers count how many
/// terminal rows the wrapped transcript occupies so the scroll offset can
/// be clamped and auto-scroll can pin the view to the bottom.
pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Number of terminal rows `lines` occupy when wrapped to `width`.
    pub fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
        if width == 0 {
            return lines.len() as u16;
        }
        let width = width as usize;
        let mut rows: usize = 0;
        for line in lines {
            let content_width: usize = line
                .spans
                .iter()
                .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
                .sum();
            rows += if content_width == 0 {
                1
            } else {
                content_width.div_ceil(width)
            };
        }
        rows.min(u16::MAX as usize) as u16
    }

    pub fn max_scroll_offset(total_rows: u16, available_height: u16) -> u16 {
        total_rows.saturating_sub(available_height)
    }

    /// Offset that pins the view to the newest content.
    pub fn scroll_to_bottom(lines: &[Line], width: u16, available_height: u16) -> u16 {
        Self::max_scroll_offset(Self::wrapped_line_count(lines, width), available_height)
    }
}
