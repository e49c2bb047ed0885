//! Keyboard mapping

use crate::sim::Direction;

/// What a key press asks the game to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Steer(Direction),
    TogglePause,
}

/// Map a `KeyboardEvent.key` value: arrows or WASD steer, Escape pauses
pub fn command_for_key(key: &str) -> Option<Command> {
    let command = match key {
        "ArrowUp" | "w" | "W" => Command::Steer(Direction::Up),
        "ArrowDown" | "s" | "S" => Command::Steer(Direction::Down),
        "ArrowLeft" | "a" | "A" => Command::Steer(Direction::Left),
        "ArrowRight" | "d" | "D" => Command::Steer(Direction::Right),
        "Escape" => Command::TogglePause,
        _ => return None,
    };
    Some(command)
}
