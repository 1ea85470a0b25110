//! Subtitle and title overlays.

use std::fmt;
use std::path::PathBuf;

use super::filters::{fmt_num, Expr, Filter, FilterChain};
use super::fonts::FontCatalog;

/// Lines longer than this are split in two.
pub const MAX_CHARS_PER_LINE: usize = 20;
const LINE_SPACING: f64 = 1.2;

/// Which frame edge `offset` is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: u32,
    pub color: String,
    pub offset: u32,
    pub stroke_width: u32,
    pub stroke_color: String,
}

impl TextStyle {
    pub fn subtitle_default() -> Self {
        Self {
            font: "NanumGothicBold".to_string(),
            size: 56,
            color: "white".to_string(),
            offset: 250,
            stroke_width: 4,
            stroke_color: "black".to_string(),
        }
    }

    pub fn title_default() -> Self {
        Self {
            font: "NanumGothicBold".to_string(),
            size: 72,
            color: "yellow".to_string(),
            offset: 280,
            stroke_width: 5,
            stroke_color: "black".to_string(),
        }
    }
}

/// Escapes for the option parser: `\`, `'` and `:`.
fn escape_option(raw: &str) -> String {
    raw.replace('\\', r"\\")
        .replace('\'', r"\'")
        .replace(':', r"\:")
}

/// Quotes for the graph parser, which otherwise splits on `,` `;` `[` `]`.
/// A literal `'` cannot appear inside quotes, so it is emitted as `'\''`.
fn quote_graph(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// Escapes user text for a drawtext `text=` value. Three layers apply: drawtext's own
/// `\`/`%` expansion, the option parser, then the graph parser.
pub fn escape_drawtext(raw: &str) -> String {
    let expanded = raw.replace('\\', r"\\").replace('%', r"\%");
    quote_graph(&escape_option(&expanded))
}

fn escape_value(raw: &str) -> String {
    quote_graph(&escape_option(raw))
}

/// Splits `text` into at most two lines of similar length, breaking on spaces when
/// possible. Counts characters, not bytes.
pub fn split_two_lines(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let total = normalized.chars().count();
    if total <= max_chars {
        return vec![normalized];
    }

    let words: Vec<&str> = normalized.split(' ').collect();
    if words.len() == 1 {
        let mid = total.div_ceil(2);
        let first: String = normalized.chars().take(mid).collect();
        let second: String = normalized.chars().skip(mid).collect();
        return vec![first, second];
    }

    let target = total as f64 / 2.0;
    let mut split_at = words.len();
    let mut length = 0usize;
    for (i, word) in words.iter().enumerate() {
        let added = word.chars().count() + usize::from(i > 0);
        if i > 0 && (length + added) as f64 > target {
            split_at = i;
            break;
        }
        length += added;
    }

    let (mut first, mut second) = (words[..split_at].join(" "), words[split_at..].join(" "));

    let imbalance = first.chars().count().abs_diff(second.chars().count());
    if !second.is_empty() && imbalance > max_chars / 2 {
        let mid = words.len().div_ceil(2);
        first = words[..mid].join(" ");
        second = words[mid..].join(" ");
    }

    if second.is_empty() {
        vec![first]
    } else {
        vec![first, second]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawText {
    pub text: String,
    pub font_file: PathBuf,
    pub size: u32,
    pub color: String,
    pub x: Expr,
    pub y: Expr,
    pub border_width: u32,
    pub border_color: String,
}

impl fmt::Display for DrawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drawtext=text={}:fontfile={}:fontsize={}:fontcolor={}:x={}:y={}:borderw={}:bordercolor={}:shadowx=0:shadowy=0",
            escape_drawtext(&self.text),
            escape_value(&self.font_file.to_string_lossy()),
            self.size,
            escape_value(&self.color),
            self.x,
            self.y,
            self.border_width,
            escape_value(&self.border_color),
        )
    }
}

/// One centered drawtext per line, `style.offset` pixels from the `anchor` edge.
/// Blank text yields an empty chain.
pub fn text_overlay(
    text: &str,
    style: &TextStyle,
    anchor: Anchor,
    fonts: &FontCatalog,
) -> FilterChain {
    let lines = split_two_lines(text, MAX_CHARS_PER_LINE);
    let lines: Vec<String> = lines.into_iter().filter(|l| !l.is_empty()).collect();
    let font_file = fonts.resolve(&style.font);
    let spacing = style.size as f64 * LINE_SPACING;
    let count = lines.len();

    let mut chain = FilterChain::new();
    for (index, line) in lines.into_iter().enumerate() {
        let y = match anchor {
            Anchor::Top => Expr::num(style.offset as f64 + spacing * index as f64),
            Anchor::Bottom => Expr::new(format!(
                "h-{}",
                fmt_num(style.offset as f64 + spacing * (count - 1 - index) as f64)
            )),
        };

        chain.push(Filter::DrawText(DrawText {
            text: line,
            font_file: font_file.clone(),
            size: style.size,
            color: style.color.clone(),
            x: Expr::new("(w-text_w)/2"),
            y,
            border_width: style.stroke_width,
            border_color: style.stroke_color.clone(),
        }));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fonts::DEFAULT_FONT_FILE;

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(escape_drawtext("a:b"), r"'a\:b'");
        assert_eq!(escape_drawtext("it's"), r"'it\'\''s'");
        assert_eq!(escape_drawtext("100%"), r"'100\\%'");
        assert_eq!(escape_drawtext(r"a\b"), r"'a\\\\b'");
        // graph separators are protected by the quotes
        assert_eq!(escape_drawtext("a,b;[c]"), "'a,b;[c]'");
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(split_two_lines("  hello   world ", 20), vec!["hello world"]);
    }

    #[test]
    fn long_text_splits_on_word_boundary() {
        let lines = split_two_lines("the quick brown fox jumps over the lazy dog", 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
        let diff = lines[0].len().abs_diff(lines[1].len());
        assert!(diff <= 10, "unbalanced split: {:?}", lines);
    }

    #[test]
    fn single_long_word_is_cut_in_half_by_chars() {
        let text = "가나다라마바사아자차카타파하가나다라마바사";
        let lines = split_two_lines(text, 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chars().count(), 11);
        assert_eq!(format!("{}{}", lines[0], lines[1]), text);
    }

    #[test]
    fn subtitle_lines_stack_up_from_bottom_edge() {
        let fonts = FontCatalog::new("fonts");
        let chain = text_overlay(
            "the quick brown fox jumps over the lazy dog",
            &TextStyle::subtitle_default(),
            Anchor::Bottom,
            &fonts,
        );
        let rendered = chain.to_string();
        assert_eq!(chain.filters().len(), 2);
        // 56 * 1.2 = 67.2 above the base offset for the first line
        assert!(rendered.contains("y='h-317.2'"));
        assert!(rendered.contains("y='h-250'"));
        assert!(rendered.contains("x='(w-text_w)/2'"));
        assert!(rendered.contains("shadowx=0:shadowy=0"));
        assert!(rendered.contains("borderw=4"));
    }

    #[test]
    fn title_measures_from_top_edge_with_unknown_font_fallback() {
        let fonts = FontCatalog::new("fonts");
        let style = TextStyle {
            font: "Not A Font".to_string(),
            ..TextStyle::title_default()
        };
        let chain = text_overlay("Title", &style, Anchor::Top, &fonts);
        let rendered = chain.to_string();
        assert!(rendered.contains(":y=280:"));
        assert!(rendered.contains(&format!("fontfile='{}'", DEFAULT_FONT_FILE)));
        assert!(rendered.contains("fontcolor='yellow'"));
    }

    #[test]
    fn blank_text_produces_no_filters() {
        let fonts = FontCatalog::new("fonts");
        let chain = text_overlay("   ", &TextStyle::subtitle_default(), Anchor::Bottom, &fonts);
        assert!(chain.is_empty());
    }
}
