//! Command implementations.

pub mod decode;
pub mod parse;

pub use self::decode::execute_decode;
pub use self::parse::execute_parse;

use crate::error::Result;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read a command's input file; `-` reads stdin.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
