//! Terminal UI.
//!
//! - `loop_runner` - The async event loop multiplexing input, channels, and
//!   signals
//! - `input` - Key routing: shortcut dispatch first, then view-local keys
//! - `render` - Line-oriented screen renderer

mod input;
mod loop_runner;
mod render;

pub use loop_runner::run;
