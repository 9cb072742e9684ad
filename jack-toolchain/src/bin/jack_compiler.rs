//! CLI for the Jack → VM compiler.

use colored::Colorize;
use jack_toolchain_lib::runner;
use log::debug;
use structopt::StructOpt;

use std::{path::PathBuf, process};

/// Compile Jack classes into VM code.
///
/// A single `.jack` file becomes a sibling `.vm` file. A directory compiles
/// every `.jack` file it contains, each to its own `.vm`.
#[derive(Debug, StructOpt)]
#[structopt(name = "jack-compiler")]
struct Args {
    /// The `.jack` file or directory of `.jack` files to compile.
    #[structopt(name = "INPUT")]
    input: PathBuf,
    /// Validate the input without writing any output.
    #[structopt(long)]
    check: bool,
}

#[paw::main]
fn main(args: Args) {
    pretty_env_logger::init();
    match runner::compile_path(&args.input, args.check) {
        Ok(_) if args.check => {
            println!(
                "{} is valid.",
                args.input.display().to_string().bright_green()
            );
        }
        Ok(outputs) => debug!("wrote {} files", outputs.len()),
        Err(why) => {
            eprintln!("{}: {}", "Error".red().bold(), why);
            process::exit(1);
        }
    }
}
