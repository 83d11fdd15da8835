//! Terminal rendering for messages.
//!
//! Assistant content is treated as formatted text: fenced code blocks and
//! list items get their own colors so replies with code stay readable. This
//! is purely a display concern.

use colored::Colorize;
use parley_core::message::{Message, MessageEntry, Role};

/// Prints one entry of the message list.
pub fn print_entry(entry: &MessageEntry, user_name: &str) {
    match entry {
        MessageEntry::Confirmed(message) => print_message(message, user_name),
        MessageEntry::Pending(pending) => {
            println!(
                "{} {}",
                format!("[{user_name}]").bright_magenta(),
                "(sending...)".bright_black()
            );
            if pending.image_preview.is_some() {
                println!("{}", "[image attached]".bright_black());
            }
            for line in pending.content.lines() {
                println!("{}", line.green());
            }
            println!();
        }
    }
}

fn print_message(message: &Message, user_name: &str) {
    match message.role {
        Role::User => {
            println!("{}", format!("[{user_name}]").bright_magenta());
            if message.has_image {
                println!("{}", "[image attached]".bright_black());
            }
            for line in message.content.lines() {
                println!("{}", line.green());
            }
        }
        Role::Assistant => {
            println!("{}", "[assistant]".bright_magenta());
            print_formatted(&message.content);
        }
    }
    println!();
}

/// Prints assistant text, coloring fenced code blocks and list items.
fn print_formatted(content: &str) {
    let mut in_code_block = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            println!("{}", line.bright_black());
        } else if in_code_block {
            println!("{}", line.cyan());
        } else if is_list_item(trimmed) {
            println!("{}", line.yellow());
        } else {
            println!("{}", line.bright_blue());
        }
    }
}

fn is_list_item(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") {
        return true;
    }
    // Ordered lists: "1. ", "12. "
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty() && line[digits.len()..].starts_with(". ")
}
