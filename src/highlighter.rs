use fxhash::FxHashSet;
use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::read;

pub const SPECIAL_FORMS: &[&str] = &[
    "def!",
    "do",
    "let*",
    "if",
    "lazy",
    "lazy-obj",
    "lazy-or",
    "destructure",
    "bind!",
];

/// `(` and `{` cycle through these by nesting depth, closers match their opener
const NESTING: [Color; 3] = [
    Color::Rgb(255, 198, 124),
    Color::Rgb(228, 124, 255),
    Color::LightBlue,
];

const LAZY: Color = Color::Yellow;
const SPECIAL: Color = Color::LightYellow;
const BUILTIN: Color = Color::LightCyan;
const MUTATOR: Color = Color::LightRed;
const CALLED: Color = Color::LightMagenta;
const PROPERTY: Color = Color::Rgb(138, 206, 0);
const STRING: Color = Color::LightGreen;
const NUMBER: Color = Color::Cyan;
const CONSTANT: Color = Color::LightBlue;
const COMMENT: Color = Color::DarkGray;
const OTHER: Color = Color::Purple;

pub struct Lisp {
    builtins: FxHashSet<&'static str>,
}

impl Lisp {
    /// Highlighter that emphasizes the given builtin names
    pub fn new(builtins: Vec<&'static str>) -> Self {
        Self {
            builtins: builtins.into_iter().collect(),
        }
    }

    /// Style of an atom. `head` is true right after an opening paren.
    fn atom(&self, atom: &str, head: bool) -> Style {
        match atom {
            "lazy" | "lazy-obj" | "lazy-or" | "destructure" => Style::from(LAZY).bold(),
            special if SPECIAL_FORMS.contains(&special) => Style::from(SPECIAL).bold(),
            // `set!`, `del!`, ... change the object they're given
            builtin if self.builtins.contains(builtin) && builtin.ends_with('!') => {
                Style::from(MUTATOR).bold()
            }
            builtin if self.builtins.contains(builtin) => Style::from(BUILTIN).bold(),

            "nil" | "undefined" | "true" | "false" => Style::from(CONSTANT).bold(),
            num if num.parse::<i64>().is_ok() => Style::from(NUMBER),
            // property names, `{:a 1}` and `(get x :a)`
            kw if kw.len() > 1 && kw.starts_with(':') => Style::from(PROPERTY),

            _ if head => Style::from(CALLED),
            _ => Style::from(OTHER),
        }
    }
}

impl Highlighter for Lisp {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();
        let mut tokens = read::tokenize_with_whitespace(line);
        let mut depth: usize = 0;

        while let Some(token) = tokens.next() {
            let trimmed = token.trim();
            let head = matches!(tokens.prev().map(str::trim), Some("("));

            let style = match trimmed {
                "(" | "{" => {
                    depth += 1;
                    Style::from(NESTING[(depth - 1) % NESTING.len()])
                }
                ")" | "}" => {
                    let style = Style::from(NESTING[depth.saturating_sub(1) % NESTING.len()]);
                    depth = depth.saturating_sub(1);
                    style
                }
                // still being typed
                open if open.starts_with('"') && (open.len() == 1 || !open.ends_with('"')) => {
                    Style::from(STRING).underline()
                }
                string if string.starts_with('"') => Style::from(STRING),
                comment if comment.starts_with(';') => Style::from(COMMENT).italic(),
                atom => self.atom(atom, head),
            };

            styled_text.push((style, token.to_string()));
        }

        styled_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(line: &str) -> Vec<(Style, String)> {
        Lisp::new(vec!["get", "set!"]).highlight(line, 0).buffer
    }

    fn style_of(spans: &[(Style, String)], text: &str) -> Option<Style> {
        spans
            .iter()
            .find(|(_, it)| it.trim() == text)
            .map(|(style, _)| *style)
    }

    #[test]
    fn test_keeps_all_text() {
        let line = r#"(def! x (lazy {:a "s" 1})) ; note"#;
        let joined: String = spans(line).into_iter().map(|(_, it)| it).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn test_forms_and_builtins() {
        let spans = spans("(lazy (set! (get x :a) :b (mine 1)))");

        assert_eq!(style_of(&spans, "lazy"), Some(Style::from(LAZY).bold()));
        assert_eq!(style_of(&spans, "get"), Some(Style::from(BUILTIN).bold()));
        assert_eq!(style_of(&spans, "set!"), Some(Style::from(MUTATOR).bold()));
        assert_eq!(style_of(&spans, "mine"), Some(Style::from(CALLED)));
        assert_eq!(style_of(&spans, ":a"), Some(Style::from(PROPERTY)));
        assert_eq!(style_of(&spans, "x"), Some(Style::from(OTHER)));
    }

    #[test]
    fn test_braces_nest_with_parens() {
        let spans = spans("({})");
        let colors = spans.iter().map(|(style, _)| *style).collect::<Vec<_>>();

        assert_eq!(colors[0], colors[3]);
        assert_eq!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_unterminated_string() {
        let spans = spans(r#"(get x "na"#);
        assert_eq!(
            style_of(&spans, r#""na"#),
            Some(Style::from(STRING).underline())
        );
    }
}
