//! Integration tests for the tokenizer framework and its highlighters.

mod common;

use common::{BaseEverything, OverlayX, flatten};
use markmode::{
    Highlighter, MarkdownRenderer, Mode, ModeError, ModeRegistry, ModeRunner, ModeSpec, Overlay,
    ScanCursor,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_eat_while_without_match_keeps_position() {
    // Arrange
    let lines = ["", "abc", "  indented", "émoji ✓"];

    for line in lines {
        let mut cursor = ScanCursor::new(line, 4);
        let before = cursor.position();

        // Act
        let moved = cursor.eat_while(|_: char| false);

        // Assert
        assert!(!moved, "Nothing should be eaten on {:?}", line);
        assert_eq!(cursor.position(), before);
    }
}

#[test]
fn test_fragmentation_is_lossless_for_every_mode() {
    // Arrange
    let highlighter = Highlighter::new();
    let registry = highlighter.initialize();
    let runner = ModeRunner::new(registry);
    let text = "# Title\n\nSome *text* with $x^2$ and `code`.\n\n\tfn main() {}\n🎉 done\n";

    for name in ["null", "gfm", "math", "markdown", "rust", "python", "no-such-lang"] {
        // Act
        let mut joined = String::new();
        runner
            .run_with(text, name, |token| joined.push_str(token.text))
            .expect("Run should succeed");
        let tree = runner.run_to_tree(text, name).expect("Run should succeed");

        // Assert
        assert_eq!(tree.text(), text, "Mode {} lost characters", name);
        assert_eq!(joined, text.replace('\n', ""), "Mode {} callback text", name);
    }
}

#[test]
fn test_current_matches_token_span() {
    // Arrange
    let registry = ModeRegistry::new();
    let runner = ModeRunner::new(&registry);
    let mode = Overlay::new(Box::new(BaseEverything), Box::new(OverlayX));
    let line = "abXcdXX";
    let mut seen = Vec::new();

    // Act
    runner
        .run_with(line, &mode as &dyn Mode, |token| {
            seen.push((token.column, token.text.to_string()));
        })
        .expect("Run should succeed");

    // Assert
    for (column, text) in seen {
        let expected: String = line.chars().skip(column).take(text.chars().count()).collect();
        assert_eq!(text, expected);
    }
}

#[test]
fn test_overlay_composition() {
    // Arrange
    let registry = ModeRegistry::new();
    let runner = ModeRunner::new(&registry);
    let mode = Overlay::new(Box::new(BaseEverything), Box::new(OverlayX));

    // Act
    let tree = runner
        .run_to_tree("aXb", &mode as &dyn Mode)
        .expect("Run should succeed");

    // Assert
    assert_eq!(
        flatten(&tree),
        vec![
            ("a".to_string(), Some("base".to_string())),
            ("X".to_string(), Some("overlay".to_string())),
            ("b".to_string(), Some("base".to_string())),
        ]
    );
}

#[test]
fn test_unknown_mode_falls_back_to_plain_lines() {
    // Arrange
    let highlighter = Highlighter::new();
    let runner = ModeRunner::new(highlighter.initialize());
    let text = "let x = 1;\n  y\nlast";

    // Act
    let tree = runner
        .run_to_tree(text, "no-such-lang")
        .expect("Unknown mode must not fail");

    // Assert
    assert_eq!(tree.lines().len(), 3);
    for (line, fragments) in text.split('\n').zip(tree.lines()) {
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, line);
        assert_eq!(fragments[0].style, None);
    }
}

#[test]
fn test_indent_column_expands_tabs() {
    // Arrange
    let tabs = ScanCursor::new("\t\tx", 4);
    let space = ScanCursor::new(" x", 4);

    // Act & Assert
    assert_eq!(tabs.indent_column(), 8);
    assert_eq!(space.indent_column(), 1);
}

#[test]
fn test_initialization_runs_once() {
    // Arrange
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&hook_calls);
    let highlighter = Highlighter::new().with_setup(move |_registry| {
        calls.fetch_add(1, Ordering::SeqCst);
    });

    // Act
    let first = highlighter.initialize() as *const ModeRegistry;
    let second = highlighter.initialize() as *const ModeRegistry;

    // Assert
    assert_eq!(first, second, "Same registry should be returned");
    assert_eq!(highlighter.setup_runs(), 1);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_match_without_consume_keeps_position() {
    // Arrange
    let mut peeking = ScanCursor::new("foobar", 4);
    let mut eating = ScanCursor::new("foobar", 4);

    // Act
    let peeked = peeking.matches_with("foo", false, false).map(|m| m.text());
    let eaten = eating.matches("foo").map(|m| m.text());

    // Assert
    assert_eq!(peeked, Some("foo"));
    assert_eq!(peeking.position(), 0);
    assert_eq!(eaten, Some("foo"));
    assert_eq!(eating.position(), 3);
}

#[test]
fn test_mime_type_resolves_to_gfm() {
    // Arrange
    let highlighter = Highlighter::new();
    let registry = highlighter.initialize();
    let runner = ModeRunner::new(registry);

    // Act
    let spec = registry.mime_spec("text/x-gfm").cloned();
    let tree = runner
        .run_to_tree("cost $a+b$", "text/x-gfm")
        .expect("Run should succeed");

    // Assert
    assert_eq!(spec.as_ref().map(ModeSpec::name), Some("gfm"));
    assert!(
        flatten(&tree)
            .iter()
            .any(|(_, style)| style.as_deref().is_some_and(|s| s.contains("math"))),
        "Math span should be styled"
    );
}

#[test]
fn test_custom_mode_registered_during_setup() {
    // Arrange
    let highlighter = Highlighter::new().with_setup(|registry| {
        registry.register_mode("shout", |_, _| Box::new(BaseEverything) as Box<dyn Mode>);
    });

    // Act
    let html = highlighter.highlight("hello", "shout").expect("Should highlight");

    // Assert
    assert_eq!(
        html,
        "<span class=\"line\"><span class=\"cm-base\">hello</span></span>"
    );
}

#[test]
fn test_markdown_document_end_to_end() {
    // Arrange
    let renderer = MarkdownRenderer::new();
    let markdown = "# Notes :rocket:\n\nInline $a^2$.\n\n```python\nprint('hi')\n```\n";

    // Act
    let html = renderer.render(markdown).expect("Should render");

    // Assert
    assert!(html.contains('🚀'));
    assert!(html.contains("data-math-style=\"inline\""));
    assert!(html.contains("<code class=\"language-python\">"));
    assert!(html.contains("cm-"));
}

#[test]
fn test_non_progress_surfaces_as_error() {
    // Arrange
    struct Lazy;

    impl markmode::Tokenizer for Lazy {
        type State = ();

        fn name(&self) -> &str {
            "lazy"
        }

        fn start_state(&self) {}

        fn token(&self, _cursor: &mut ScanCursor<'_>, _state: &mut ()) -> markmode::Result<Option<String>> {
            Ok(None)
        }
    }

    let registry = ModeRegistry::new();
    let runner = ModeRunner::new(&registry);

    // Act
    let result = runner.run_to_tree("x", &Lazy as &dyn Mode);

    // Assert
    assert!(matches!(result, Err(ModeError::NonProgress { .. })));
}

#[test]
fn test_malformed_pattern_reaches_caller() {
    // Arrange
    struct Pattern;

    impl markmode::Tokenizer for Pattern {
        type State = usize;

        fn name(&self) -> &str {
            "pattern"
        }

        fn start_state(&self) -> usize {
            0
        }

        fn token(&self, cursor: &mut ScanCursor<'_>, lines: &mut usize) -> markmode::Result<Option<String>> {
            *lines += 1;
            if *lines == 2 {
                markmode::mode::compile_pattern("(")?;
            }
            cursor.skip_to_end();
            Ok(None)
        }
    }

    let registry = ModeRegistry::new();
    let runner = ModeRunner::new(&registry);
    let mut tokenized = Vec::new();

    // Act
    let result = runner.run_with("one\ntwo\nthree", &Pattern as &dyn Mode, |token| {
        tokenized.push(token.text.to_string())
    });

    // Assert
    assert!(matches!(result, Err(ModeError::MalformedPattern(_))), "{:?}", result);
    assert_eq!(tokenized, vec!["one".to_string()]);
}
