//! Server-side syntax highlighting for the file viewer.
//!
//! Output is a `<pre class="highlight">` block where every source line is its own
//! `<span class="line">`, so clients can mark cited line ranges by index.

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::{ApiError, ApiResult};

const THEME_NAME: &str = "InspiredGitHub";

/// Language name reported to clients for `path`
pub fn language_from_path(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "py" => "python",
        "java" => "java",
        "go" => "go",
        "cs" => "csharp",
        "json" => "json",
        "md" => "markdown",
        _ => "text",
    }
}

// Local copy of syntect's `escape::Escape`, which is private in syntect 5.x
struct Escape<'a>(&'a str);

impl std::fmt::Display for Escape<'_> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Escape(s) = *self;
        let mut last = 0;
        for (i, ch) in s.bytes().enumerate() {
            let rep = match ch as char {
                '>' => "&gt;",
                '<' => "&lt;",
                '&' => "&amp;",
                '\'' => "&#39;",
                '"' => "&quot;",
                _ => continue,
            };
            fmt.write_str(&s[last..i])?;
            fmt.write_str(rep)?;
            last = i + 1;
        }
        if last < s.len() {
            fmt.write_str(&s[last..])?;
        }
        Ok(())
    }
}

/// HTML-escape text placed inside the viewer markup
pub fn escape_html(text: &str) -> String {
    Escape(text).to_string()
}

/// Syntax and theme sets, loaded once and shared by every request
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("syntaxes", &self.syntax_set.syntaxes().len())
            .field("theme", &self.theme.name)
            .finish()
    }
}

impl Highlighter {
    pub fn new() -> ApiResult<Self> {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .remove(THEME_NAME)
            .ok_or_else(|| ApiError::Internal(format!("Missing theme {THEME_NAME}")))?;
        tracing::debug!("Loaded {} syntaxes", syntax_set.syntaxes().len());
        Ok(Self { syntax_set, theme })
    }

    fn syntax_for(&self, language: &str) -> &SyntaxReference {
        // The bundled syntaxes have no TypeScript grammar; JavaScript is close enough
        let extension = match language {
            "typescript" | "javascript" => "js",
            "python" => "py",
            "java" => "java",
            "go" => "go",
            "csharp" => "cs",
            "json" => "json",
            "markdown" => "md",
            _ => "",
        };
        self.syntax_set
            .find_syntax_by_extension(extension)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Render `code` as highlighted HTML for `language`.
    pub fn highlight(&self, code: &str, language: &str) -> ApiResult<String> {
        let syntax = self.syntax_for(language);
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let background = self.theme.settings.background.unwrap_or(Color::WHITE);
        let mut html = format!(
            "<pre class=\"highlight\" style=\"background-color:#{:02x}{:02x}{:02x};\"><code data-language=\"{}\">",
            background.r,
            background.g,
            background.b,
            escape_html(language)
        );

        for line in LinesWithEndings::from(code) {
            let regions = highlighter
                .highlight_line(line, &self.syntax_set)
                .map_err(|e| ApiError::Internal(format!("Highlighting failed: {e}")))?;
            let trimmed: Vec<_> = regions
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches(['\r', '\n'])))
                .filter(|(_, text)| !text.is_empty())
                .collect();
            let rendered = styled_line_to_highlighted_html(&trimmed, IncludeBackground::No)
                .map_err(|e| ApiError::Internal(format!("Highlighting failed: {e}")))?;
            html.push_str("<span class=\"line\">");
            html.push_str(&rendered);
            html.push_str("</span>\n");
        }

        html.push_str("</code></pre>");
        Ok(html)
    }
}
