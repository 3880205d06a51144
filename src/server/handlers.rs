pub mod fetch;

pub use fetch::{REWRITTEN_HEADER, handle_fetch};
