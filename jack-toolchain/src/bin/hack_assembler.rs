//! CLI for the two-pass Hack assembler.

use colored::Colorize;
use jack_toolchain_lib::runner;
use log::debug;
use structopt::StructOpt;

use std::{path::PathBuf, process};

/// Translate Hack assembly into binary machine code.
///
/// The output is written next to the input with the extension replaced by
/// `.hack`, one 16-bit instruction per line.
#[derive(Debug, StructOpt)]
#[structopt(name = "hack-assembler")]
struct Args {
    /// The `.asm` file to assemble.
    #[structopt(name = "FILE")]
    file: PathBuf,
    /// Validate the input without writing any output.
    #[structopt(long)]
    check: bool,
}

#[paw::main]
fn main(args: Args) {
    pretty_env_logger::init();
    match runner::assemble_file(&args.file, args.check) {
        Ok(Some(output)) => debug!("wrote {}", output.display()),
        Ok(None) => {
            println!(
                "{} is valid.",
                args.file.display().to_string().bright_green()
            );
        }
        Err(why) => {
            eprintln!("{}: {}", "Error".red().bold(), why);
            process::exit(1);
        }
    }
}
