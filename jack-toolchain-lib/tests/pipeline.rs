//! End-to-end tests: Jack source through VM and assembly down to binary,
//! in memory and through the file drivers.

use jack_toolchain_lib::{
    assembler,
    error::TranslateError,
    jack,
    runner::{self, RunnerError},
    vm::Translator,
};

use std::fs;
use std::path::PathBuf;

/// A fresh directory under the system temp dir, unique per test and process.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "jack-toolchain-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("Failed to create scratch directory");
    dir
}

#[test]
fn jack_compiles_down_to_binary() {
    let source =
        "class Main { function void main() { do Output.printInt(1 + 2); return; } }";
    let code = jack::compile(source).expect("Compilation failed");
    let vm_text: String = code
        .iter()
        .map(|command| format!("{}\n", command))
        .collect();
    let mut translator = Translator::new();
    translator.write_bootstrap();
    translator
        .translate_unit("Main", &vm_text)
        .expect("Translation failed");
    let asm = translator.finish().join("\n");
    let binary = assembler::assemble(&asm).expect("Assembly failed");
    assert!(!binary.is_empty());
    // SP = 256 comes first.
    assert_eq!(binary[0], "0000000100000000");
    for line in &binary {
        assert_eq!(line.len(), 16);
        assert!(line.bytes().all(|b| b == b'0' || b == b'1'));
    }
}

#[test]
fn files_flow_through_the_runner() {
    let dir = scratch_dir("runner");
    let jack_file = dir.join("Main.jack");
    fs::write(
        &jack_file,
        "class Main { function void main() { return; } }",
    )
    .unwrap();

    let outputs = runner::compile_path(&jack_file, false).unwrap();
    assert_eq!(outputs, vec![dir.join("Main.vm")]);
    let vm_text = fs::read_to_string(&outputs[0]).unwrap();
    assert!(vm_text.starts_with("function Main.main 0\n"));

    let asm_file = runner::translate_path(&dir, false).unwrap().unwrap();
    let dir_name = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(asm_file, dir.join(format!("{}.asm", dir_name)));
    let asm = fs::read_to_string(&asm_file).unwrap();
    assert!(asm.starts_with("// bootstrap\n@256\n"));

    let hack_file = runner::assemble_file(&asm_file, false).unwrap().unwrap();
    let hack = fs::read_to_string(&hack_file).unwrap();
    assert_eq!(hack.lines().next().unwrap(), "0000000100000000");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn statics_resolve_to_distinct_cells_across_units() {
    let dir = scratch_dir("statics");
    fs::write(
        dir.join("Alpha.vm"),
        "function Alpha.go 0\npush constant 1\npop static 0\nreturn\n",
    )
    .unwrap();
    fs::write(
        dir.join("Beta.vm"),
        "function Beta.go 0\npush constant 2\npop static 0\nreturn\n",
    )
    .unwrap();

    let asm_file = runner::translate_path(&dir, false).unwrap().unwrap();
    let asm = fs::read_to_string(&asm_file).unwrap();
    assert!(asm.contains("@Alpha.0"));
    assert!(asm.contains("@Beta.0"));

    // The assembler gives the two statics distinct RAM addresses.
    let binary = assembler::assemble(&asm).unwrap();
    let code_lines: Vec<&str> = asm
        .lines()
        .filter(|line| !line.starts_with("//") && !line.starts_with('('))
        .collect();
    let alpha = code_lines.iter().position(|line| *line == "@Alpha.0").unwrap();
    let beta = code_lines.iter().position(|line| *line == "@Beta.0").unwrap();
    assert_ne!(binary[alpha], binary[beta]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn the_first_failing_unit_aborts_a_directory_translation() {
    let dir = scratch_dir("failing");
    fs::write(dir.join("Aaa.vm"), "push constant 1\n").unwrap();
    fs::write(dir.join("Bbb.vm"), "push nowhere 1\n").unwrap();

    match runner::translate_path(&dir, false) {
        Err(RunnerError::Translate { path, source }) => {
            assert_eq!(path, dir.join("Bbb.vm"));
            assert_eq!(
                source,
                TranslateError::UnknownSegment {
                    segment: "nowhere".into(),
                    line: 1,
                }
            );
        }
        other => panic!("expected a translate error, got {:?}", other),
    }
    // No output was written.
    let dir_name = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(!dir.join(format!("{}.asm", dir_name)).exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_mode_validates_without_writing() {
    let dir = scratch_dir("check");
    let jack_file = dir.join("Main.jack");
    fs::write(
        &jack_file,
        "class Main { function void main() { return; } }",
    )
    .unwrap();

    assert!(runner::compile_path(&jack_file, true).unwrap().is_empty());
    assert!(!dir.join("Main.vm").exists());

    // An invalid unit still fails the check.
    fs::write(&jack_file, "class Main { broken").unwrap();
    assert!(runner::compile_path(&jack_file, true).is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn wrong_extensions_are_usage_errors() {
    let dir = scratch_dir("extension");
    let stray = dir.join("notes.txt");
    fs::write(&stray, "hello").unwrap();

    assert!(matches!(
        runner::assemble_file(&stray, false),
        Err(RunnerError::InvalidInput { .. })
    ));
    assert!(matches!(
        runner::translate_path(&stray, false),
        Err(RunnerError::InvalidInput { .. })
    ));
    assert!(matches!(
        runner::compile_path(&stray, false),
        Err(RunnerError::InvalidInput { .. })
    ));

    // A directory with no matching units is reported, not silently empty.
    let empty = dir.join("empty");
    fs::create_dir_all(&empty).unwrap();
    assert!(matches!(
        runner::translate_path(&empty, false),
        Err(RunnerError::NoUnits { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}
