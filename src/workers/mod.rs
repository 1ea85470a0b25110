pub mod renderer;
pub mod sweeper;
