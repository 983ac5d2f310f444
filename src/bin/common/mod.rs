pub mod progress;

pub use progress::CliReporter;
