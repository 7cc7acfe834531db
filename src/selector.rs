use anyhow::{Result, bail};
use std::fmt;
use std::io::{BufRead, Write};
use tracing::debug;

use crate::console::Console;

/// Models the local runtime is expected to have installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalModel {
    Llama31,
    Phi3,
    Mistral,
}

impl LocalModel {
    pub const ALL: [LocalModel; 3] = [Self::Llama31, Self::Phi3, Self::Mistral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llama31 => "llama3.1",
            Self::Phi3 => "phi3",
            Self::Mistral => "mistral",
        }
    }

    fn from_choice(raw: &str) -> Option<Self> {
        let choice = raw.trim();
        if let Ok(number) = choice.parse::<usize>() {
            return number
                .checked_sub(1)
                .and_then(|idx| Self::ALL.get(idx).copied());
        }
        Self::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(choice))
    }
}

impl fmt::Display for LocalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn select_local_model<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<LocalModel> {
    writeln!(
        console.out(),
        "Choose a local model to use (you must have it installed!):"
    )?;
    for (idx, model) in LocalModel::ALL.iter().enumerate() {
        writeln!(console.out(), "  {}. {}", idx + 1, model)?;
    }

    loop {
        let raw = console.read_line("Enter number or name: ")?;
        if raw.is_empty() {
            bail!("Error selecting local model: input closed before a choice was made");
        }

        match LocalModel::from_choice(&raw) {
            Some(model) => {
                debug!(model = %model, "local model selected");
                writeln!(console.out(), "You selected: {model}")?;
                return Ok(model);
            }
            None => writeln!(console.out(), "Invalid choice '{}', try again.", raw.trim())?,
        }
    }
}
