//! Channels to long-running manager tasks live here

pub use push_manager_chan::*;

mod push_manager_chan;
