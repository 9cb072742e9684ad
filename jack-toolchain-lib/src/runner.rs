//! Drivers that feed files and directories through the translators.
//!
//! A translation unit is one input file: its stream is opened, drained and
//! its output written next to it, closed along every exit path by ownership.
//! Directory translations share state only where the VM calling convention
//! requires it (one [`vm::Translator`] across all units). The first failing
//! unit aborts the whole invocation.

use log::debug;
use thiserror::Error;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::TranslateError;
use crate::{assembler, jack, vm};

/// Errors of the driver layer.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{_0}")]
    Io(#[from] io::Error),
    /// A unit failed to translate; the path names the offender.
    #[error("{}: {}", .path.display(), .source)]
    Translate {
        path: PathBuf,
        source: TranslateError,
    },
    #[error("expected a `.{}` file, found `{}`", .extension, .path.display())]
    InvalidInput {
        path: PathBuf,
        extension: &'static str,
    },
    #[error("no `.{}` files in `{}`", .extension, .path.display())]
    NoUnits {
        path: PathBuf,
        extension: &'static str,
    },
}

/// Assemble a `.asm` file into a sibling `.hack` file.
///
/// With `check` set, the input is only validated and nothing is written.
/// Returns the path written to, if any.
pub fn assemble_file(path: &Path, check: bool) -> Result<Option<PathBuf>, RunnerError> {
    require_extension(path, "asm")?;
    let source = fs::read_to_string(path)?;
    let binary = assembler::assemble(&source).map_err(|source| RunnerError::Translate {
        path: path.to_path_buf(),
        source,
    })?;
    if check {
        return Ok(None);
    }
    let output = path.with_extension("hack");
    write_lines(&output, &binary)?;
    Ok(Some(output))
}

/// Translate a `.vm` file or a directory of `.vm` files into one `.asm`.
///
/// A single file becomes a sibling `.asm` without bootstrap. A directory
/// becomes `<dir>/<dirname>.asm`, starting with the bootstrap and holding
/// every unit in lexicographic file-name order.
pub fn translate_path(path: &Path, check: bool) -> Result<Option<PathBuf>, RunnerError> {
    let mut translator = vm::Translator::new();
    let output = if path.is_dir() {
        let units = units_in_directory(path, "vm")?;
        translator.write_bootstrap();
        for unit in &units {
            let stem = file_stem(unit);
            translator.write_comment(&format!("file {}", stem));
            let source = fs::read_to_string(unit)?;
            translator
                .translate_unit(&stem, &source)
                .map_err(|source| RunnerError::Translate {
                    path: unit.clone(),
                    source,
                })?;
        }
        path.join(format!("{}.asm", file_stem(path)))
    } else {
        require_extension(path, "vm")?;
        let source = fs::read_to_string(path)?;
        translator
            .translate_unit(&file_stem(path), &source)
            .map_err(|source| RunnerError::Translate {
                path: path.to_path_buf(),
                source,
            })?;
        path.with_extension("asm")
    };
    if check {
        return Ok(None);
    }
    write_lines(&output, &translator.finish())?;
    Ok(Some(output))
}

/// Compile a `.jack` file or every `.jack` file in a directory, each into a
/// sibling `.vm`. Returns the paths written.
pub fn compile_path(path: &Path, check: bool) -> Result<Vec<PathBuf>, RunnerError> {
    let units = if path.is_dir() {
        units_in_directory(path, "jack")?
    } else {
        require_extension(path, "jack")?;
        vec![path.to_path_buf()]
    };
    let mut outputs = vec![];
    for unit in &units {
        let source = fs::read_to_string(unit)?;
        let code = jack::compile(&source).map_err(|source| RunnerError::Translate {
            path: unit.clone(),
            source,
        })?;
        if !check {
            let lines: Vec<String> = code.iter().map(|command| command.to_string()).collect();
            let output = unit.with_extension("vm");
            write_lines(&output, &lines)?;
            outputs.push(output);
        }
    }
    Ok(outputs)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), RunnerError> {
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    debug!("wrote {} lines to {}", lines.len(), path.display());
    Ok(())
}

/// The `.{extension}` files directly inside `dir`, in file-name order.
fn units_in_directory(dir: &Path, extension: &'static str) -> Result<Vec<PathBuf>, RunnerError> {
    let mut units: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == extension))
        .collect();
    units.sort();
    if units.is_empty() {
        return Err(RunnerError::NoUnits {
            path: dir.to_path_buf(),
            extension,
        });
    }
    debug!("found {} `.{}` units in {}", units.len(), extension, dir.display());
    Ok(units)
}

fn require_extension(path: &Path, extension: &'static str) -> Result<(), RunnerError> {
    if path.extension().map_or(false, |ext| ext == extension) {
        Ok(())
    } else {
        Err(RunnerError::InvalidInput {
            path: path.to_path_buf(),
            extension,
        })
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
