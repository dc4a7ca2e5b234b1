use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Indentation applied to each nested output section.
const INDENT: usize = 4;

/// Errors produced by [`Output`] implementations when writing to the terminal.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Underlying I/O error while writing to the terminal.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// Abstraction over how user-facing progress messages are produced.
///
/// A cascade usually runs unattended in CI, so this stream is the primary
/// record of what happened. Implementations can render to a terminal or
/// suppress output entirely.
pub trait Output: Send + Sync {
    /// Print an informational message.
    fn message(&self, msg: &str) -> Result<()>;
    /// Print a success message.
    fn success(&self, msg: &str) -> Result<()>;
    /// Print a warning message.
    fn warn(&self, msg: &str) -> Result<()>;
    /// Print an error/failure message.
    fn fail(&self, msg: &str) -> Result<()>;
    /// Flush any buffered output.
    fn finish(&self) -> Result<()>;
    /// Create a nested output section that indents subsequent messages.
    fn section(&self, header: &str) -> Box<dyn Output>;
}

/// Output implementation that suppresses all messages.
pub struct Quiet;

impl Output for Quiet {
    fn message(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn success(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn warn(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn fail(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn section(&self, _header: &str) -> Box<dyn Output> {
        Box::new(Quiet)
    }
}

/// Color-capable terminal renderer for progress messages.
pub struct Terminal {
    /// Whether ANSI colors are emitted.
    color_choice: ColorChoice,
    /// Number of spaces prefixed to every line.
    indent: usize,
}

impl Terminal {
    /// Create a new terminal output.
    ///
    /// - `color`: when `true`, always render colored output; when `false`,
    ///   disable ANSI colors.
    pub fn new(color: bool) -> Self {
        let color_choice = if color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self {
            color_choice,
            indent: 0,
        }
    }

    /// Write a single line in `color` at the current indentation.
    fn write_colored(&self, msg: &str, color: Color) -> Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        for line in msg.lines() {
            writeln!(stdout, "{}{line}", " ".repeat(self.indent))?;
        }
        stdout.reset()?;
        stdout.flush()?;
        Ok(())
    }
}

impl Output for Terminal {
    fn message(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Cyan)
    }

    fn success(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Green)
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Rgb(255, 165, 0)) // Orange
    }

    fn fail(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Red)
    }

    fn finish(&self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn section(&self, header: &str) -> Box<dyn Output> {
        if let Err(err) = self.message(header) {
            tracing::warn!(error = %err, "failed to write section header");
        }

        Box::new(Self {
            color_choice: self.color_choice,
            indent: self.indent + INDENT,
        })
    }
}
