mod command;
mod engine;
mod join;

pub use command::{Command, CommandOutput, Projection};
pub use engine::Engine;
pub use join::nested_loop_join;
