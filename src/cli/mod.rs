pub mod console;

pub use console::{run, trim_history, HISTORY_LIMIT};
