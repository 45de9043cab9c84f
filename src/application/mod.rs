pub mod bootstrap;
pub mod commands;
pub mod connection;
pub mod session_log;
pub mod task_sync;

#[cfg(test)]
mod test_support;
