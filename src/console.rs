use anyhow::{Context, Result};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Prompted line input plus the stream command output is written to.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and returns the next line exactly as read, terminator
    /// included. End of input yields an empty string.
    pub fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}").context("Failed to write prompt")?;
        self.output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        Ok(line)
    }

    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        let line = self.read_line(prompt)?;
        Ok(strip_line_terminator(&line).to_string())
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
