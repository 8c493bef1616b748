//! Syntax highlighting into inline-styled HTML.
//!
//! The output deliberately has no `<pre>` envelope: the envelope's style
//! attribute is captured and handed back so the page template can apply it
//! to its own container.

use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::html::{start_highlighted_html_snippet, styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxDefinition, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::assets::{AssetStore, HTTP_SYNTAX};
use crate::render::RenderError;

/// Visual style used for every page.
pub const STYLE_NAME: &str = "InspiredGitHub";

const LINE_BREAKS: &[char] = &['\r', '\n'];

/// Result of highlighting one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    /// One line of spans per input line, joined with `\n`. Text ending in a
    /// newline ends with an empty line.
    pub html: String,
    /// CSS declarations from the suppressed `<pre>` wrapper.
    pub style: String,
}

/// Grammar and style registry. Built once at startup; loading the default
/// syntax set is expensive.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Load the default grammars plus the HTTP wire-format grammar.
    pub fn new(assets: &dyn AssetStore) -> Result<Self, RenderError> {
        let source = assets.text(HTTP_SYNTAX)?;
        let http = SyntaxDefinition::load_from_str(source, true, None).map_err(|e| RenderError::Grammar {
            name: HTTP_SYNTAX.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = SyntaxSet::load_defaults_newlines().into_builder();
        builder.add(http);
        let syntaxes = builder.build();

        let theme = resolve_theme(ThemeSet::load_defaults(), STYLE_NAME);

        tracing::debug!(
            grammars = syntaxes.syntaxes().len(),
            style = STYLE_NAME,
            "Highlighter ready"
        );

        Ok(Self { syntaxes, theme })
    }

    /// Resolve a grammar by name or file extension, falling back to plain text.
    pub fn grammar(&self, name: &str) -> &SyntaxReference {
        self.syntaxes
            .find_syntax_by_token(name)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    /// Tokenize `text` in one pass and format the tokens as HTML spans.
    pub fn highlight(&self, grammar: &str, text: &str) -> Result<Highlighted, RenderError> {
        let syntax = self.grammar(grammar);
        let mut tokenizer = HighlightLines::new(syntax, &self.theme);

        let mut lines = Vec::new();
        for line in LinesWithEndings::from(text) {
            let tokens: Vec<(Style, &str)> = tokenizer
                .highlight_line(line, &self.syntaxes)?
                .into_iter()
                .map(|(style, piece)| (style, piece.trim_end_matches(LINE_BREAKS)))
                .filter(|(_, piece)| !piece.is_empty())
                .collect();
            lines.push(styled_line_to_highlighted_html(&tokens, IncludeBackground::No)?);
        }
        // a trailing newline still opens an empty last row
        if text.ends_with('\n') {
            lines.push(String::new());
        }

        let (envelope, _) = start_highlighted_html_snippet(&self.theme);

        Ok(Highlighted {
            html: lines.join("\n"),
            style: wrapper_style(&envelope),
        })
    }
}

fn resolve_theme(mut themes: ThemeSet, name: &str) -> Theme {
    if let Some(theme) = themes.themes.remove(name) {
        return theme;
    }
    tracing::warn!(style = name, "Style not found, using fallback");
    themes.themes.into_values().next().unwrap_or_default()
}

/// Pull the `style="..."` value out of a wrapper tag.
fn wrapper_style(envelope: &str) -> String {
    envelope
        .split_once("style=\"")
        .and_then(|(_, rest)| rest.split_once('"'))
        .map(|(style, _)| style.to_string())
        .unwrap_or_default()
}
