pub mod event;
pub mod spawn;
pub mod step;
pub mod world;
