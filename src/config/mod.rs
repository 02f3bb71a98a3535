pub mod settings;

pub use settings::{DeletePolicy, Settings};
