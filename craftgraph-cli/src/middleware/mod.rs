//! Node middleware for CLI runs.

mod progress;

pub use progress::ProgressMiddleware;

#[cfg(test)]
pub(crate) use progress::exit_line as progress_exit_line;
