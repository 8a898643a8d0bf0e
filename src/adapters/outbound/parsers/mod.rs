/// Manifest parsers for repository files
mod runtime_pin_parser;

pub use runtime_pin_parser::RuntimePinParser;
