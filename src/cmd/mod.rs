//! CLI command implementations.
//!
//! | Module   | Commands handled                    |
//! |----------|-------------------------------------|
//! | `route`  | default invocation (`--step ...`)   |
//! | `steps`  | `Steps`                             |
//! | `config` | `Config`                            |

pub mod config;
pub mod route;
pub mod steps;

pub use config::cmd_config;
pub use route::cmd_route;
pub use steps::cmd_steps;
