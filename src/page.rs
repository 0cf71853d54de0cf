//! Standalone HTML document wrapper.

use maud::{DOCTYPE, Markup, PreEscaped, html};

const KATEX_VERSION: &str = "0.16.11";

/// Typesets every comrak math span once the page has loaded.
///
/// Errors are drawn inline in red instead of aborting the page, and
/// non-standard input is accepted without warnings.
const KATEX_BOOTSTRAP: &str = r#"document.addEventListener("DOMContentLoaded", function () {
  document.querySelectorAll("[data-math-style]").forEach(function (el) {
    katex.render(el.textContent, el, {
      displayMode: el.getAttribute("data-math-style") === "display",
      throwOnError: false,
      strict: false
    });
  });
});"#;

/// Minimal theme for `cm-*` token classes.
const TOKEN_STYLES: &str = r#"pre code .line { display: inline; }
.cm-keyword { color: #8839ef; }
.cm-def { color: #1e66f5; }
.cm-type { color: #df8e1d; }
.cm-string, .cm-string-2 { color: #40a02b; }
.cm-number, .cm-atom { color: #fe640b; }
.cm-comment { color: #8c8fa1; font-style: italic; }
.cm-operator, .cm-punctuation { color: #179299; }
.cm-variable-2, .cm-variable-3 { color: #d20f39; }
.cm-meta, .cm-tag { color: #ea76cb; }
.cm-header { font-weight: bold; }
.cm-strong { font-weight: bold; }
.cm-em { font-style: italic; }
.cm-link { text-decoration: underline; }
.cm-math { color: #7287fd; }"#;

/// Wraps rendered markdown in a complete document.
///
/// Loads KaTeX from a CDN when `math` is set so that math spans render in
/// the browser.
///
/// # Arguments
///
/// * `title`: Document title
/// * `body`: Rendered markdown HTML, inserted verbatim
/// * `math`: Whether to load KaTeX
pub fn standalone_page(title: &str, body: &str, math: bool) -> Markup {
    let katex = format!("https://cdn.jsdelivr.net/npm/katex@{KATEX_VERSION}/dist");

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if math {
                    link rel="stylesheet" href={ (katex) "/katex.min.css" };
                    script defer src={ (katex) "/katex.min.js" } {}
                    script { (PreEscaped(KATEX_BOOTSTRAP)) }
                }
                style { (PreEscaped(TOKEN_STYLES)) }
            }
            body {
                article class="markdown-body" {
                    (PreEscaped(body))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_page_structure() {
        // Arrange
        let body = "<h1>Hi</h1>";

        // Act
        let html = standalone_page("Notes", body, true).into_string();

        // Assert
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Notes</title>"));
        assert!(html.contains("<article class=\"markdown-body\"><h1>Hi</h1></article>"));
    }

    #[test]
    fn test_math_loads_katex() {
        // Arrange & Act
        let html = standalone_page("Math", "", true).into_string();

        // Assert
        assert!(html.contains("katex.min.js"));
        assert!(html.contains("katex.min.css"));
        assert!(html.contains("throwOnError: false"));
        assert!(html.contains("strict: false"));
    }

    #[test]
    fn test_no_math_skips_katex() {
        // Arrange & Act
        let html = standalone_page("Plain", "<p>x</p>", false).into_string();

        // Assert
        assert!(!html.contains("katex"), "KaTeX should not load: {}", html);
        assert!(html.contains(".cm-keyword"));
    }

    #[test]
    fn test_title_is_escaped() {
        // Arrange & Act
        let html = standalone_page("<b>&</b>", "", false).into_string();

        // Assert
        assert!(html.contains("<title>&lt;b&gt;&amp;&lt;/b&gt;</title>"));
    }
}
