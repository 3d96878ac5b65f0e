/*!
Terminal formatting for the human-readable `tools` listing.

Everything here returns strings; nothing prints. Machine formats (json,
yaml) never go through these helpers.

Environment:
  NO_COLOR  disable ANSI colors
  NO_EMOJI  disable emoji markers
  (both are also off when stdout is not a terminal)
  COLUMNS   table width hint (clamped to 40..=220, default 100)
*/

use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let term_width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        Self {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
            term_width,
        }
    }

    /// No color, no emoji. Used when stdout is not a terminal.
    pub fn plain(term_width: usize) -> Self {
        Self {
            use_color: false,
            use_emoji: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Title,
    Header,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    let text = text.as_ref();
    if !style.use_color {
        return text.to_string();
    }
    let code = match role {
        Role::Title => "1;38;5;45",
        Role::Header => "38;5;213",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "tool" => "🛠 ",
        _ => "",
    }
}

/// Column-aligned table. The widest columns are shrunk first when the
/// total would exceed the terminal width.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    const GAP: &str = "  ";
    const MIN_COL: usize = 4;

    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().take(cols).enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let total = widths.iter().sum::<usize>() + GAP.len() * (cols - 1);
    let mut overflow = total.saturating_sub(style.term_width);
    while overflow > 0 {
        let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if widest <= MIN_COL {
            break;
        }
        let shrink = (widest - MIN_COL).min(overflow).min(widest / 4 + 1);
        widths[idx] -= shrink;
        overflow -= shrink;
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(color(
        Role::Header,
        render_row(headers.iter().copied(), &widths, GAP),
        style,
    ));
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join(GAP);
    lines.push(color(Role::Dim, rule, style));
    for row in rows {
        let cells = (0..cols).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        lines.push(render_row(cells, &widths, GAP));
    }
    lines.join("\n")
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], gap: &str) -> String {
    let joined = cells
        .zip(widths)
        .map(|(cell, &w)| fit(cell, w))
        .collect::<Vec<_>>()
        .join(gap);
    joined.trim_end().to_string()
}

fn fit(cell: &str, width: usize) -> String {
    let cell = truncate_ellipsis(cell, width);
    let pad = width.saturating_sub(display_width(&cell));
    format!("{cell}{}", " ".repeat(pad))
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if display_width(s) <= max_chars {
        return s.to_string();
    }
    match max_chars {
        0 => String::new(),
        1 => "…".to_string(),
        n => {
            let mut out: String = strip_ansi(s).chars().take(n - 1).collect();
            out.push('…');
            out
        }
    }
}

/// Removes CSI sequences (`ESC [ ... letter`).
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for t in chars.by_ref() {
                if t.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let style = StyleOptions::plain(100);
        let t = table(
            &["NAME", "PARAMS"],
            &[
                vec!["post".into(), "text*".into()],
                vec!["search_notes".into(), "query*, limit".into()],
            ],
            &style,
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("NAME          PARAMS"));
        assert!(lines[1].starts_with("------------  "));
        assert!(lines[2].starts_with("post          text*"));
    }

    #[test]
    fn table_shrinks_to_width() {
        let style = StyleOptions::plain(40);
        let long = "x".repeat(80);
        let t = table(&["A", "B"], &[vec!["short".into(), long]], &style);
        for line in t.lines() {
            assert!(display_width(line) <= 40, "{line}");
        }
        assert!(t.contains('…'));
    }

    #[test]
    fn plain_style_has_no_escapes() {
        let style = StyleOptions::plain(80);
        assert_eq!(color(Role::Title, "x", &style), "x");
        assert_eq!(emoji("tool", &style), "");
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
        assert_eq!(truncate_ellipsis("abc", 1), "…");
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi("\x1b[1;38;5;45mRED\x1b[0m"), "RED");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
