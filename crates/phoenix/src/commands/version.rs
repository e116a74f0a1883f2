//! Version command

use anyhow::Result;
use std::process::ExitCode;

use crate::cli::VersionArgs;
use crate::version::VersionInfo;

pub fn run(args: VersionArgs) -> Result<ExitCode> {
    let info = VersionInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info.display());
    }

    Ok(ExitCode::SUCCESS)
}
