//! Code block highlighting with syntect

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::html::escape;
use crate::config::HighlightConfig;

/// Syntax highlighter for fenced code
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl Highlighter {
    /// Create a highlighter, or `None` when highlighting is disabled
    pub fn from_config(config: &HighlightConfig) -> Option<Self> {
        if !config.enable {
            return None;
        }
        let mut theme_set = ThemeSet::load_defaults();
        let theme = match theme_set.themes.remove(&config.theme) {
            Some(theme) => theme,
            None => {
                tracing::warn!(
                    "Unknown highlight theme {:?}, falling back to the first bundled one",
                    config.theme
                );
                let first = theme_set.themes.keys().next().cloned()?;
                theme_set.themes.remove(&first)?
            }
        };
        Some(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers: config.line_number,
        })
    }

    /// Highlight `code` written in `lang`. `None` when the language is unknown.
    pub fn highlight(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))?;

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let regions = highlighter.highlight_line(line, &self.syntax_set).ok()?;
            let html = styled_line_to_highlighted_html(&regions[..], IncludeBackground::No).ok()?;
            lines.push(html);
        }

        let lang = escape(lang);
        if self.line_numbers {
            Some(self.add_line_numbers(&lines, &lang))
        } else {
            Some(format!(
                r#"<figure class="highlight {lang}"><pre><code class="language-{lang}">{}</code></pre></figure>"#,
                lines.concat()
            ))
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, lines: &[String], lang: &str) -> String {
        let gutter: Vec<String> = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect();
        let code: Vec<&str> = lines.iter().map(|l| l.trim_end_matches('\n')).collect();

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            lang,
            gutter.join("\n"),
            code.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled() {
        let config = HighlightConfig {
            enable: false,
            ..Default::default()
        };
        assert!(Highlighter::from_config(&config).is_none());
    }

    #[test]
    fn test_highlight_known_language() {
        let highlighter = Highlighter::from_config(&HighlightConfig::default()).unwrap();
        let html = highlighter.highlight("fn main() {}\n", "rust").unwrap();
        assert!(html.contains("highlight rust"));
        assert!(html.contains("<span"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language() {
        let highlighter = Highlighter::from_config(&HighlightConfig::default()).unwrap();
        assert!(highlighter.highlight("x", "no-such-language").is_none());
    }

    #[test]
    fn test_line_numbers() {
        let config = HighlightConfig {
            line_number: true,
            ..Default::default()
        };
        let highlighter = Highlighter::from_config(&config).unwrap();
        let html = highlighter.highlight("a = 1\nb = 2\n", "py").unwrap();
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(html.contains(r#"<td class="gutter">"#));
    }
}
