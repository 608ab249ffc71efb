pub mod catalog;

pub use catalog::AppState;
