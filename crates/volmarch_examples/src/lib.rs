#![forbid(unsafe_code)]

mod output;

pub use output::{init_tracing, output_path, write_png};
