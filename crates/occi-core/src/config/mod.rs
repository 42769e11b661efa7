mod env;
mod text;

pub use text::TextConfig;
