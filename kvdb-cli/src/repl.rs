//! Interactive REPL: reads a line, sends it verbatim, prints the reply.

use colored::Colorize;
use kvdb_client::Client;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::net::SocketAddr;

const HELP_TEXT: &str = r#"
Available commands:
  GET key                 Fetch the value for a key ($_ if absent)
  SET key value            Set a key to a value
  DEL key                  Delete a key

  help                     Show this help
  quit, exit               Exit the REPL
"#;

pub async fn run(client: Client, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "kvdb".bold().cyan());
    println!("Connected to {addr}");
    println!("Type 'help' for available commands.\n");

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".kvdb_history"))
        .unwrap_or_else(|_| ".kvdb_history".into());
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = format!("{} ", "kvdb>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.to_lowercase().as_str() {
                    "help" | "?" => {
                        println!("{HELP_TEXT}");
                        continue;
                    }
                    "quit" | "exit" | "q" => break,
                    _ => {}
                }

                match client.send(line).await {
                    Ok(reply) => println!("{reply}\n"),
                    Err(e) => println!("{}: {e}\n", "Error".red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {err:?}", "Error".red());
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    println!("{}", "Disconnected.".dimmed());
    Ok(())
}
