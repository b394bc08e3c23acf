use serde::Serialize;

use crate::types::OutputFormat;

/// Print a command result to stdout.
///
/// JSON goes to stdout only; all logging goes to stderr so pipelines can
/// consume the output directly.
pub fn print_result<T: Serialize>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        },
        OutputFormat::Simple => {
            // Simple mode renders scalars bare and everything else as
            // single-line JSON.
            match serde_json::to_value(value) {
                Ok(serde_json::Value::String(s)) => println!("{}", s),
                Ok(serde_json::Value::Null) => println!("null"),
                Ok(v) => println!("{}", v),
                Err(e) => eprintln!("Failed to serialize output: {}", e),
            }
        }
    }
}
