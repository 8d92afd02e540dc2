//! Decode command implementation.

use super::read_input;
use crate::cli::DecodeArgs;
use crate::error::Result;
use crate::output::Formatter;
use trialparse_domain::{DecodeReport, RelationRecordCodec};

/// Execute the decode command.
pub fn execute_decode(args: DecodeArgs, formatter: &Formatter) -> Result<()> {
    let report = decode_file(&args)?;
    println!("{}", formatter.format_decode(&report)?);
    Ok(())
}

fn decode_file(args: &DecodeArgs) -> Result<DecodeReport> {
    let text = read_input(&args.file)?;
    Ok(RelationRecordCodec::decode_with_report(&text)?)
}
