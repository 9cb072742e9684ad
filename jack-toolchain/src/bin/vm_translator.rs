//! CLI for the VM → Hack assembly translator.

use colored::Colorize;
use jack_toolchain_lib::runner;
use log::debug;
use structopt::StructOpt;

use std::{path::PathBuf, process};

/// Translate VM code into Hack assembly.
///
/// A single `.vm` file becomes a sibling `.asm` file without the bootstrap.
/// A directory becomes `<dir>/<dirname>.asm`: the bootstrap (`SP=256`,
/// `call Sys.init 0`) followed by every `.vm` file in name order.
#[derive(Debug, StructOpt)]
#[structopt(name = "vm-translator")]
struct Args {
    /// The `.vm` file or directory of `.vm` files to translate.
    #[structopt(name = "INPUT")]
    input: PathBuf,
    /// Validate the input without writing any output.
    #[structopt(long)]
    check: bool,
}

#[paw::main]
fn main(args: Args) {
    pretty_env_logger::init();
    match runner::translate_path(&args.input, args.check) {
        Ok(Some(output)) => debug!("wrote {}", output.display()),
        Ok(None) => {
            println!(
                "{} is valid.",
                args.input.display().to_string().bright_green()
            );
        }
        Err(why) => {
            eprintln!("{}: {}", "Error".red().bold(), why);
            process::exit(1);
        }
    }
}
