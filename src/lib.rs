pub mod client;
pub mod config;
pub mod contracts;
pub mod evidence;
pub mod mock;
pub mod state;
pub mod workflow;

#[cfg(test)]
mod testing;
