//! Line-by-line text measurement.
//!
//! The host has already wrapped the text; this module recovers where it
//! wrapped. Each line is found by probing growing and shrinking character
//! ranges of the text node until the probed box stays on one line and stops
//! widening. Justified text is emitted word by word since inter-word spacing
//! varies.

use crate::probe::RangeProbe;
use drawdom_dom::NodeId;
use drawdom_scene::Path;
use drawdom_traits::TextRange;
use drawdom_types::{Color, Rect};

/// Inputs of one text node's layout, taken from its parent's computed style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayoutParams {
    pub font_size: f32,
    pub justify: bool,
    /// `white-space: pre | pre-wrap`: keep runs of whitespace, expand tabs.
    pub preserve_whitespace: bool,
    /// Width of the containing element, used to guess the first line length.
    pub container_width: f32,
}

impl TextLayoutParams {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            justify: false,
            preserve_whitespace: false,
            container_width: 0.0,
        }
    }

    pub fn from_style(style: &drawdom_style::ComputedStyle, container_width: f32) -> Self {
        let white_space = style.get("white-space").to_ascii_lowercase();
        Self {
            font_size: style.px("font-size"),
            justify: style.get("text-align") == "justify",
            preserve_whitespace: white_space == "pre" || white_space == "pre-wrap",
            container_width,
        }
    }

    /// Characters to try for the first guess of a line end.
    fn estimated_line_length(&self) -> usize {
        let estimate = (self.container_width / self.font_size * 5.0).floor();
        if estimate > 0.0 && estimate.is_finite() {
            estimate as usize
        } else {
            500
        }
    }
}

/// A piece of text drawn as one unit: a line, or a word of justified text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub rect: Rect,
}

/// Splits the text node into drawable fragments in reading order.
pub fn layout_text(
    text: &str,
    node: NodeId,
    probe: &dyn RangeProbe,
    params: &TextLayoutParams,
) -> Vec<TextFragment> {
    let chars: Vec<char> = text.chars().collect();
    let Some(last) = chars.iter().rposition(|c| !c.is_whitespace()) else {
        return Vec::new();
    };
    if params.font_size <= 0.0 {
        return Vec::new();
    }
    let mut engine = LineFinder {
        chars: &chars,
        node,
        probe,
        params,
        end: last + 1,
        estimate: params.estimated_line_length(),
        start: 0,
        fragments: Vec::new(),
    };
    while engine.next_chunk() {}
    engine.fragments
}

struct LineFinder<'a> {
    chars: &'a [char],
    node: NodeId,
    probe: &'a dyn RangeProbe,
    params: &'a TextLayoutParams,
    /// One past the last non-whitespace character.
    end: usize,
    estimate: usize,
    start: usize,
    fragments: Vec<TextFragment>,
}

impl LineFinder<'_> {
    fn probe(&self, start: usize, end: usize) -> Rect {
        self.probe.probe(TextRange::new(self.node, start, end))
    }

    /// Emits one fragment. Returns `false` once the node is finished.
    fn next_chunk(&mut self) -> bool {
        let chunk_origin = self.start;
        let Some(skip) = self.chars[self.start..].iter().position(|c| !c.is_whitespace()) else {
            return false;
        };
        self.start += skip;
        if self.start >= self.end {
            return false;
        }
        let first = self.start;
        let mut line_box = self.probe(first, first + 1);

        let mut word_end = None;
        if self.params.justify
            && let Some(gap) = self.chars[first..].iter().position(|c| c.is_whitespace())
        {
            let word = self.probe(first, first + gap);
            if word.bottom() == line_box.bottom() {
                line_box = word;
                word_end = Some(first + gap);
            }
        }

        let last = match word_end {
            Some(e) => {
                self.start = e;
                e
            }
            None => {
                let eol = self.find_eol(first, &mut line_box);
                if eol == first {
                    // Nothing more fits; drop the rest of the node.
                    return false;
                }
                self.start = eol;
                let trailing = self.chars[first..eol]
                    .iter()
                    .rev()
                    .take_while(|c| c.is_whitespace())
                    .count();
                if trailing == eol - first {
                    return true;
                }
                if trailing > 0 {
                    line_box = self.probe(first, eol - trailing);
                }
                eol - trailing
            }
        };

        let raw: String = self.chars[first..last].iter().collect();
        let text = if !self.params.preserve_whitespace {
            collapse_whitespace(&raw)
        } else if raw.contains('\t') {
            let column = column_after(&self.chars[chunk_origin..first], 0);
            expand_tabs(&raw, column)
        } else {
            raw
        };
        log::trace!("text fragment {:?} at {:?}", text, line_box);
        self.fragments.push(TextFragment {
            text,
            rect: line_box,
        });
        true
    }

    /// Binary search for the end of the line starting at `first`. Shrinks
    /// the range while it spans more than one line and grows it while its
    /// right edge keeps moving. Leaves the line's box in `line_box`.
    fn find_eol(&self, first: usize, line_box: &mut Rect) -> usize {
        let (mut min, mut max) = (first, self.end);
        let mut eol = self.end.min(first + self.estimate);
        loop {
            let r = self.probe(first, eol);
            if r.bottom() != line_box.bottom() && min < eol {
                max = eol;
                eol = (min + eol) / 2;
            } else if r.right() != line_box.right() {
                *line_box = r;
                if eol < max {
                    min = eol;
                    eol = (eol + max) / 2;
                } else {
                    return eol;
                }
            } else {
                return eol;
            }
        }
    }
}

/// Collapses each run of whitespace to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

const TAB_WIDTH: usize = 8;

/// Column reached after `chars`, starting at `column`. Tabs advance to the
/// next tab stop; line breaks reset to zero.
fn column_after(chars: &[char], column: usize) -> usize {
    chars.iter().fold(column, |cc, &c| match c {
        '\t' => cc + TAB_WIDTH - cc % TAB_WIDTH,
        '\n' | '\r' => 0,
        _ => cc + 1,
    })
}

/// Replaces tabs with spaces up to the next multiple of eight, given the
/// column the string starts at.
pub fn expand_tabs(s: &str, start_column: usize) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    for c in s.chars() {
        if c == '\t' {
            let n = TAB_WIDTH - (start_column + pos) % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', n));
            pos += n;
        } else {
            out.push(c);
            pos += 1;
        }
    }
    out
}

/// Colors of the text decorations in effect, each taken from the outermost
/// ancestor that declared it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDecorations {
    pub underline: Option<Color>,
    pub line_through: Option<Color>,
    pub overline: Option<Color>,
}

impl TextDecorations {
    /// Adds the decorations of `text-decoration` in `color` where not
    /// already set by an ancestor.
    pub fn inherit(&self, decoration: &str, color: Option<Color>) -> Self {
        let mut next = self.clone();
        if decoration.is_empty() || decoration == "none" {
            return next;
        }
        for name in decoration.split_whitespace() {
            let slot = match name {
                "underline" => &mut next.underline,
                "line-through" => &mut next.line_through,
                "overline" => &mut next.overline,
                _ => continue,
            };
            if slot.is_none() {
                *slot = color.clone();
            }
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.underline.is_none() && self.line_through.is_none() && self.overline.is_none()
    }
}

/// Stroked lines for the decorations of one text fragment.
pub fn decoration_lines(rect: &Rect, font_size: f32, decorations: &TextDecorations) -> Vec<Path> {
    let width = font_size / 12.0;
    [
        (&decorations.underline, rect.bottom()),
        (&decorations.line_through, rect.bottom() - rect.height / 2.7),
        (&decorations.overline, rect.top()),
    ]
    .into_iter()
    .filter_map(|(color, y)| {
        let color = color.clone()?;
        let y = y - width;
        Some(
            Path::new()
                .move_to(rect.left(), y)
                .line_to(rect.right(), y)
                .with_stroke(color, width),
        )
    })
    .collect()
}
