//! Operator-facing command-line loop (spec §6 "Toward operators").
//!
//! Grounded on `agents/cli.rs`'s `NetworkTopologyCLI`: a blocking
//! `io::stdin` read loop with `println!` feedback. Unlike the teacher's
//! hardcoded command matching, every line here is routed through the
//! grammar reference resolver (component F) so that a `device <pattern>`
//! prefix picks up whatever grammar schema discovery produced.

use crate::controller::Controller;
use crate::grammar::{EditContext, ResolvedReference};
use std::io::{self, BufRead, Write};

/// Runs the interactive loop until EOF or an explicit `quit`.
///
/// If `controller.eager_grammar_enabled()` is set (the `-g` startup flag,
/// spec §6), every known device's grammar is pre-expanded before the
/// first prompt is shown.
pub async fn run(controller: &mut Controller) -> io::Result<()> {
    if controller.eager_grammar_enabled() {
        for (device, outcome) in controller.ensure_all_grammars().await {
            if let Err(err) = outcome {
                eprintln!("warning: eager grammar synthesis failed for {device}: {err}");
            }
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "netctrl> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        match controller
            .resolve_reference("mountpoint", &tokens, &EditContext::new())
            .await
        {
            Ok(ResolvedReference::Substitute(name)) => {
                println!("resolved mountpoint -> {name}");
            }
            Ok(ResolvedReference::Unresolved) => {
                println!("(no mountpoint reference applicable to this line)");
            }
            Err(err) => {
                println!("error: {err}");
            }
        }
    }
    Ok(())
}
