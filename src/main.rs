use anyhow::{Context, Result};
use markmode::{Config, Highlighter, MarkdownRenderer};
use std::fs;
use std::io::{self, Read, Write};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the stderr subscriber.
///
/// `RUST_LOG` filters output unless `--verbose` asks for everything at
/// debug level.
fn init_tracing(config: &Config) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if !config.verbose => filter,
        _ => EnvFilter::new(config.log_level()),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .init();
}

fn read_input(config: &Config) -> Result<String> {
    if config.reads_stdin() {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read markdown from stdin")?;
        return Ok(content);
    }

    fs::read_to_string(&config.input)
        .with_context(|| format!("Failed to read {}", config.input.display()))
}

fn write_output(config: &Config, html: &str) -> Result<()> {
    match &config.output {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = html.len(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config);
    config.validate().context("Invalid configuration")?;

    let highlighter = Highlighter::with_config(config.mode_config());

    if config.list_modes {
        let registry = highlighter.initialize();
        let mut stdout = io::stdout().lock();
        for name in registry.mode_names() {
            writeln!(stdout, "{}", name).context("Failed to write to stdout")?;
        }
        return Ok(());
    }

    let content = read_input(&config)?;
    let renderer = MarkdownRenderer::with_options(config.render_options(), highlighter);
    let body = renderer
        .render(&content)
        .context("Failed to render markdown")?;

    let html = if config.standalone {
        markmode::standalone_page(&config.document_title(), &body, !config.no_math).into_string()
    } else {
        body
    };

    write_output(&config, &html)
}
