//! Interactive conversation loop
//!
//! One turn per input line. History is kept across turns, trimmed to the
//! most recent entries so the model's context stays bounded.

use std::io::{self, Write};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::{Agent, Message};

/// Messages retained across turns; older entries are dropped first
pub const HISTORY_LIMIT: usize = 10;

/// Drop the oldest messages so at most `limit` remain, newest preserved
/// in their original order.
pub fn trim_history(history: &mut Vec<Message>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

pub async fn run(agent: Agent) -> Result<()> {
    println!("Welcome to docq. Ask questions about the loaded documents.");
    println!("Type 'exit' or 'quit' to end the conversation.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<Message> = Vec::new();

    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        // An interrupt ends the session the same way 'exit' does
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        history.push(Message::user(input));
        match agent.run_turn(&mut history).await {
            Ok(reply) => println!("Agent: {}", reply),
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                eprintln!("Agent error: {}. The session continues; try again.", e);
            }
        }

        trim_history(&mut history, HISTORY_LIMIT);
    }

    println!("\nExiting the conversation. Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_history(n: usize) -> Vec<Message> {
        (0..n).map(|i| Message::user(format!("message {}", i))).collect()
    }

    #[test]
    fn test_trim_keeps_most_recent_in_order() {
        let mut history = numbered_history(11);
        trim_history(&mut history, 10);

        assert_eq!(history.len(), 10);
        assert_eq!(history[0].text(), "message 1");
        assert_eq!(history[9].text(), "message 10");
    }

    #[test]
    fn test_trim_is_a_no_op_under_the_limit() {
        let mut history = numbered_history(4);
        trim_history(&mut history, 10);
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_exit_commands_are_case_insensitive() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("Quit"));
        assert!(!is_exit_command("exits"));
        assert!(!is_exit_command("hello"));
    }
}
