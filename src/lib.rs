pub mod analyzers;
pub mod branches;
pub mod error;
pub mod output;
pub mod parser;
pub mod segmenter;
pub mod settings;
pub mod sources;
pub mod telemetry;
