//! Embedded stylesheet injected into every rendered document.

/// Class added to `<body>` so the stylesheet only styles rendered content.
pub const CONTENT_CLASS: &str = "body";

/// Presentational CSS for rendered documents.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    css: String,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Stylesheet {
    /// The built-in stylesheet, optionally minified.
    ///
    /// Minification failures fall back to the unminified source.
    pub fn new(minify: bool) -> Self {
        let css = if minify {
            match Self::minify_css(DEFAULT_CSS) {
                Ok(css) => css,
                Err(e) => {
                    tracing::warn!("Failed to minify stylesheet: {}", e);
                    DEFAULT_CSS.to_string()
                }
            }
        } else {
            DEFAULT_CSS.to_string()
        };

        Self { css }
    }

    /// Use caller-supplied CSS instead of the built-in stylesheet.
    pub fn from_css(css: impl Into<String>) -> Self {
        Self { css: css.into() }
    }

    /// CSS text placed inside the injected `<style>` element.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

// GitHub-flavoured markdown look, scoped to `.body` and following the
// reader's colour scheme.
const DEFAULT_CSS: &str = r#"
.body {
  color-scheme: light;
  --fg-default: #1f2328;
  --fg-muted: #59636e;
  --bg-default: #ffffff;
  --bg-muted: #f6f8fa;
  --bg-neutral: rgba(175, 184, 193, 0.2);
  --border-default: #d1d9e0;
  --border-muted: #d1d9e0b3;
  --accent-fg: #0969da;
  --danger-fg: #d1242f;
}

@media (prefers-color-scheme: dark) {
  .body {
    color-scheme: dark;
    --fg-default: #f0f6fc;
    --fg-muted: #9198a1;
    --bg-default: #0d1117;
    --bg-muted: #151b23;
    --bg-neutral: rgba(101, 108, 118, 0.2);
    --border-default: #3d444d;
    --border-muted: #3d444db3;
    --accent-fg: #4493f8;
    --danger-fg: #f85149;
  }
}

.body {
  box-sizing: border-box;
  max-width: 980px;
  margin: 0 auto;
  padding: 45px;
  color: var(--fg-default);
  background-color: var(--bg-default);
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", "Noto Sans", Helvetica, Arial, sans-serif;
  font-size: 16px;
  line-height: 1.5;
  word-wrap: break-word;
}

@media (max-width: 767px) {
  .body {
    padding: 15px;
  }
}

.body a {
  color: var(--accent-fg);
  text-decoration: none;
}

.body a:hover {
  text-decoration: underline;
}

.body h1,
.body h2,
.body h3,
.body h4,
.body h5,
.body h6 {
  margin-top: 24px;
  margin-bottom: 16px;
  font-weight: 600;
  line-height: 1.25;
}

.body h1 {
  padding-bottom: 0.3em;
  font-size: 2em;
  border-bottom: 1px solid var(--border-muted);
}

.body h2 {
  padding-bottom: 0.3em;
  font-size: 1.5em;
  border-bottom: 1px solid var(--border-muted);
}

.body h3 {
  font-size: 1.25em;
}

.body h4 {
  font-size: 1em;
}

.body h5 {
  font-size: 0.875em;
}

.body h6 {
  font-size: 0.85em;
  color: var(--fg-muted);
}

.body p,
.body blockquote,
.body ul,
.body ol,
.body dl,
.body table,
.body pre {
  margin-top: 0;
  margin-bottom: 16px;
}

.body blockquote {
  margin-left: 0;
  margin-right: 0;
  padding: 0 1em;
  color: var(--fg-muted);
  border-left: 0.25em solid var(--border-default);
}

.body ul,
.body ol {
  padding-left: 2em;
}

.body li + li {
  margin-top: 0.25em;
}

.body hr {
  height: 0.25em;
  margin: 24px 0;
  padding: 0;
  background-color: var(--border-default);
  border: 0;
}

.body img {
  max-width: 100%;
  box-sizing: content-box;
  background-color: var(--bg-default);
}

.body code,
.body pre {
  font-family: ui-monospace, SFMono-Regular, "SF Mono", Menlo, Consolas, "Liberation Mono", monospace;
  font-size: 85%;
}

.body code {
  padding: 0.2em 0.4em;
  margin: 0;
  white-space: break-spaces;
  background-color: var(--bg-neutral);
  border-radius: 6px;
}

.body pre {
  padding: 16px;
  overflow: auto;
  line-height: 1.45;
  background-color: var(--bg-muted);
  border-radius: 6px;
}

.body pre code {
  padding: 0;
  font-size: 100%;
  white-space: pre;
  background-color: transparent;
  border: 0;
}

.body table {
  display: block;
  width: max-content;
  max-width: 100%;
  overflow: auto;
  border-spacing: 0;
  border-collapse: collapse;
}

.body table th {
  font-weight: 600;
}

.body table th,
.body table td {
  padding: 6px 13px;
  border: 1px solid var(--border-default);
}

.body table tr:nth-child(2n) {
  background-color: var(--bg-muted);
}

.body del {
  color: var(--danger-fg);
}

.body .footnote-definition {
  font-size: 12px;
  color: var(--fg-muted);
}

.body .footnote-definition p {
  display: inline;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stylesheet_targets_content_class() {
        let sheet = Stylesheet::default();
        assert!(sheet.css().contains(&format!(".{CONTENT_CLASS} ")));
        assert!(sheet.css().contains("prefers-color-scheme: dark"));
    }

    #[test]
    fn minified_stylesheet_is_smaller() {
        let plain = Stylesheet::new(false);
        let minified = Stylesheet::new(true);

        assert!(minified.css().len() < plain.css().len());
        assert!(minified.css().contains(".body"));
    }

    #[test]
    fn custom_css_is_kept_verbatim() {
        let sheet = Stylesheet::from_css("p { margin: 0 }");
        assert_eq!(sheet.css(), "p { margin: 0 }");
    }

    #[test]
    fn minify_strips_whitespace() {
        let css = Stylesheet::minify_css(".a {\n  color: red;\n}\n").unwrap();
        assert!(!css.contains('\n'));
        assert!(css.starts_with(".a{"));
    }
}
