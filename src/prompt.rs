//! Asking for icon IDs when none were passed on the command line.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

const QUIT: &str = "q";

/// Prompts until the user enters at least one ID. Returns `None` if the user
/// asked to quit.
pub fn prompt_for_slugs<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<Option<Vec<String>>> {
    writeln!(
        output,
        "Paste the IDs of the icons you want to download, separated by spaces:"
    )?;
    writeln!(output, "For example: classicon_paladin inv_ore_oxxein")?;
    writeln!(output, "You can also enter '{}' to quit.", QUIT)?;

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("failed to read input")?;

        if read == 0 {
            bail!("input ended before any icon IDs were entered");
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == QUIT {
            return Ok(None);
        }

        return Ok(Some(line.split_whitespace().map(str::to_owned).collect()));
    }
}
