pub mod attributes;
pub mod cli;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod settings;
