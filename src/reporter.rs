use std::io::{self, Write};

use colored::{Color, Colorize};
use rand::seq::IndexedRandom;
use serde_json::Value;

use crate::api::ApiError;
use crate::types::GameState;

/// Terminal reset sequence: clears the screen and homes the cursor.
const CLEAR_SCREEN: &str = "\x1bc";

/// Colors picked from at random for each status line. They carry no meaning.
const PALETTE: [Color; 5] = [
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

pub fn random_color() -> Color {
    PALETTE
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(Color::Green)
}

/// One status line for an account whose state was fetched.
pub fn format_state_line(account: usize, state: &GameState, color: Color) -> String {
    let fishes = Value::Array(state.fishes.clone()).to_string();
    format!(
        "Account {} | Level: {} | Gold: {} | Fish Limit: {} | Fishes: {}",
        account.to_string().color(color),
        state.level.to_string().color(color),
        state.gold.to_string().color(color),
        state.fish_limit.to_string().color(color),
        fishes.color(color),
    )
}

/// Status line for an account whose state could not be fetched this cycle.
pub fn format_failure_line(account: usize, err: &ApiError) -> String {
    format!("Failed to fetch game state for account {account}: {err}")
        .red()
        .to_string()
}

/// Clear the terminal and draw all lines at once.
pub fn render<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    let mut frame = String::from(CLEAR_SCREEN);
    for line in lines {
        frame.push_str(line);
        frame.push('\n');
    }
    out.write_all(frame.as_bytes())?;
    out.flush()
}
