pub mod capabilities;
pub mod config;
pub mod normalize;
pub mod simulate;
pub mod states;
