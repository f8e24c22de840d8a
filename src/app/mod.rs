pub mod committer;
pub mod data_accessor;
pub mod loader;
pub mod number_generator;
