//! Plain aligned tables for terminal output.

#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

const SEPARATOR: &str = "  ";
const MIN_COLUMN: usize = 4;

/// Header plus string rows.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub const fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Render with a dashed divider under the header.
    #[must_use]
    pub fn render(&self, options: TableOptions) -> String {
        let widths = self.column_widths(options.max_width);

        let header = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(text, width)| pad(&truncate(text, *width), *width))
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        let header = header.trim_end().to_string();
        let divider = "-".repeat(header.chars().count());

        let mut lines = vec![header, divider];
        for row in &self.rows {
            let line = widths
                .iter()
                .enumerate()
                .map(|(index, width)| {
                    let text = truncate(row.get(index).map_or("-", String::as_str), *width);
                    let padded = pad(&text, *width);
                    if options.color {
                        paint(&text, padded)
                    } else {
                        padded
                    }
                })
                .collect::<Vec<_>>()
                .join(SEPARATOR);
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    fn column_widths(&self, max_width: Option<usize>) -> Vec<usize> {
        let mut widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|value| value.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect::<Vec<_>>();

        let Some(max_width) = max_width else {
            return widths;
        };
        let budget = max_width.saturating_sub(SEPARATOR.len() * widths.len().saturating_sub(1));
        // Shrink the widest column until the row fits or nothing can shrink.
        while widths.iter().sum::<usize>() > budget {
            let Some(widest) = widths
                .iter_mut()
                .filter(|width| **width > MIN_COLUMN)
                .max_by_key(|width| **width)
            else {
                break;
            };
            *widest -= 1;
        }
        widths
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept = text.chars().take(width.saturating_sub(1)).collect::<String>();
    format!("{kept}~")
}

/// Color known status and severity values. Padding stays outside the escape.
fn paint(text: &str, padded: String) -> String {
    let code = match text {
        "sev1" | "tamper_alert" => "31",
        "sev2" | "new" | "reopened" => "33",
        "in_progress" | "triaged" => "36",
        "resolved" | "closed" | "done" => "32",
        "on_hold" | "cancelled" => "90",
        _ => return padded,
    };
    let rest = &padded[text.len()..];
    format!("\u{1b}[{code}m{text}\u{1b}[0m{rest}")
}
