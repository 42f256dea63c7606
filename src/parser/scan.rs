//! Depth-aware scanning over loosely typed JSON text
//!
//! A single left-to-right pass tracks brace/bracket nesting and whether the
//! cursor sits inside a double-quoted string. Delimiters only count when they
//! appear outside strings at nesting depth zero.
//!
//! Only double quotes open strings. Single-quoted text is scanned like any
//! other unquoted token.

/// Mutable state carried through one character scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanState {
    /// Open `{` minus closed `}` seen outside strings
    pub brace_depth: i32,

    /// Open `[` minus closed `]` seen outside strings
    pub bracket_depth: i32,

    /// Between an opening and a matching unescaped closing `"`
    pub in_string: bool,

    /// Previous character was an unescaped backslash
    pub escape_pending: bool,
}

impl ScanState {
    /// Create a fresh state at depth zero, outside any string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both nesting counters are back at zero.
    pub fn at_top_level(&self) -> bool {
        self.brace_depth == 0 && self.bracket_depth == 0
    }

    /// Feed one character and report whether it is `delimiter` at top level.
    ///
    /// Rules, in priority order:
    /// 1. a pending escape consumes this character as a literal
    /// 2. `\` sets a pending escape (inside or outside strings)
    /// 3. `"` toggles the in-string flag
    /// 4. inside a string every character is inert
    /// 5. otherwise braces/brackets update the depths, and the delimiter
    ///    matches only when both depths are zero
    pub fn advance(&mut self, ch: char, delimiter: char) -> bool {
        if self.escape_pending {
            self.escape_pending = false;
            return false;
        }

        match ch {
            '\\' => {
                self.escape_pending = true;
                return false;
            }
            '"' => {
                self.in_string = !self.in_string;
                return false;
            }
            _ if self.in_string => return false,
            '{' => self.brace_depth += 1,
            '}' => self.brace_depth -= 1,
            '[' => self.bracket_depth += 1,
            ']' => self.bracket_depth -= 1,
            _ => {}
        }

        ch == delimiter && self.at_top_level()
    }
}

/// Split `text` on `delimiter`, ignoring delimiters nested in `{}`/`[]` or
/// inside string literals.
///
/// Parts are returned as slices of the input, untrimmed. Text after the last
/// split point becomes a final part; a trailing empty part is not emitted.
///
/// # Example
///
/// ```
/// use mongoq::parser::split_top_level;
///
/// let parts = split_top_level("a:1, b:{c:2, d:3}", ',');
/// assert_eq!(parts, vec!["a:1", " b:{c:2, d:3}"]);
/// ```
pub fn split_top_level(text: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut state = ScanState::new();
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if state.advance(ch, delimiter) {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }

    let rest = &text[start..];
    if !rest.is_empty() {
        parts.push(rest.strip_suffix(delimiter).unwrap_or(rest));
    }

    parts
}

/// Byte offset of the first top-level `:` in `text`, if any.
pub fn find_main_colon(text: &str) -> Option<usize> {
    let mut state = ScanState::new();
    text.char_indices()
        .find(|&(_, ch)| state.advance(ch, ':'))
        .map(|(idx, _)| idx)
}
