mod unicode;

pub use unicode::{display_width, truncate_to_width};
