pub mod activity;
pub mod color;
pub mod fmt;
pub mod layout;
pub mod quota;

pub use layout::{render_lines, render_to, LineComposer};
