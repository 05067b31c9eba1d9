pub mod agents;
pub mod config;
pub mod errors;
pub mod gates;
pub mod guidance;
pub mod output;
pub mod planner_config;
pub mod qr;
pub mod sequencer;
pub mod step;
