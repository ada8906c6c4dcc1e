pub mod arena;
pub mod bot;
pub mod controller;
pub mod eval;
pub mod game;
pub mod movegen;
pub mod search;

pub use arena::*;
pub use bot::*;
pub use controller::*;
pub use game::*;
