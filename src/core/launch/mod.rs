pub mod composer;
pub mod task;

pub use composer::compose_launch;
pub use task::launch_game;
