use std::io::{self, Write};

use crate::cli::{execute, parse_line, Commands, HELP_LINES};
use crate::core::config::Config;
use crate::core::error::BoardflowError;

pub fn run(config: &Config) -> Result<(), BoardflowError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        print!("boardflow> ");
        stdout.flush().map_err(|e| BoardflowError::invalid(e))?;

        let bytes_read = stdin.read_line(&mut line).map_err(|e| BoardflowError::invalid(e))?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        if trimmed.eq_ignore_ascii_case("help") {
            for help in HELP_LINES {
                println!("{help}");
            }
            continue;
        }

        match parse_line(trimmed) {
            Ok(Commands::Repl) | Ok(Commands::Shell) => {
                eprintln!("Already in REPL.");
            }
            Ok(other) => {
                if let Err(err) = execute(other, config) {
                    eprintln!("{err}");
                }
            }
            Err(err) => {
                eprintln!("{err}");
            }
        }
    }

    Ok(())
}
