mod session;
mod turn;

pub use session::{ChatMessage, ChatSession, ModeSwitch, TurnHandle};
pub use turn::{run_turn, spawn_turn, TurnUpdate};
