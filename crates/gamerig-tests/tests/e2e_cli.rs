//! Command-line workflows against files on disk: sample, validate, generate.

use std::process::ExitCode;

use gamerig_cli::commands::generate::{self, GenerateArgs};
use gamerig_cli::commands::{sample, validate};
use gamerig_cli::input::load_previous;
use gamerig_generate::RigRegistry;
use gamerig_spec::{Bone, Metarig};
use gamerig_tests::fixtures::{self, MetarigDir};
use pretty_assertions::assert_eq;

#[test]
fn every_sample_validates_and_generates() {
    let dir = MetarigDir::new();
    for rig_type in RigRegistry::global().names() {
        let path = dir.path(&format!("{}.json", rig_type));
        let path = path.to_str().unwrap();
        assert_eq!(sample::run(rig_type, Some(path)).unwrap(), ExitCode::SUCCESS);
        assert_eq!(validate::run(path, true).unwrap(), ExitCode::SUCCESS, "{}", rig_type);

        let out = dir.path(rig_type);
        let args = GenerateArgs {
            metarig: path,
            out_dir: out.to_str(),
            seed: Some(fixtures::SEED),
            ..GenerateArgs::default()
        };
        assert_eq!(generate::run(&args).unwrap(), ExitCode::SUCCESS, "{}", rig_type);
        assert!(out.join("rig.rig.json").exists(), "{}", rig_type);
    }
}

#[test]
fn generated_files_match_library_output() {
    let dir = MetarigDir::new();
    let path = dir.add("leg", &fixtures::leg());
    let out = dir.path("out");
    let args = GenerateArgs {
        metarig: path.to_str().unwrap(),
        out_dir: out.to_str(),
        seed: Some(fixtures::SEED),
        json: true,
        ..GenerateArgs::default()
    };
    assert_eq!(generate::run(&args).unwrap(), ExitCode::SUCCESS);

    let expected = fixtures::generate(&fixtures::leg());
    let script = std::fs::read_to_string(out.join(format!("{}.txt", expected.ui.script_name))).unwrap();
    assert_eq!(script, expected.script);

    let previous = load_previous(&out.join("rig.rig.json")).unwrap();
    assert_eq!(previous.bone_names(), expected.armature.bone_names());
}

#[test]
fn regenerating_keeps_rig_id() {
    let dir = MetarigDir::new();
    let path = dir.add("tentacle", &fixtures::segmented_tentacle());
    let first_out = dir.path("first");
    let first = GenerateArgs {
        metarig: path.to_str().unwrap(),
        out_dir: first_out.to_str(),
        ..GenerateArgs::default()
    };
    assert_eq!(generate::run(&first).unwrap(), ExitCode::SUCCESS);
    let rig_file = first_out.join("rig.rig.json");

    let second_out = dir.path("second");
    let second = GenerateArgs {
        metarig: path.to_str().unwrap(),
        out_dir: second_out.to_str(),
        previous: rig_file.to_str(),
        ..GenerateArgs::default()
    };
    assert_eq!(generate::run(&second).unwrap(), ExitCode::SUCCESS);

    let scripts = |out: &std::path::Path| -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".txt"))
            .collect();
        names.sort();
        names
    };
    assert_eq!(scripts(&first_out).len(), 1);
    assert_eq!(scripts(&first_out), scripts(&second_out));
}

#[test]
fn strict_flag_fails_on_unknown_rig_type() {
    let dir = MetarigDir::new();
    let metarig = fixtures::arm().with_bone(Bone::new("extra", [0.0; 3], [0.0, 0.0, 1.0]).with_rig_type("wings"));
    let path = dir.add("arm", &metarig);

    // Validation only warns about the unknown type.
    assert_eq!(validate::run(path.to_str().unwrap(), true).unwrap(), ExitCode::SUCCESS);

    let (lenient_out, strict_out) = (dir.path("lenient"), dir.path("strict"));
    let lenient = GenerateArgs {
        metarig: path.to_str().unwrap(),
        out_dir: lenient_out.to_str(),
        ..GenerateArgs::default()
    };
    assert_eq!(generate::run(&lenient).unwrap(), ExitCode::SUCCESS);

    let strict = GenerateArgs {
        metarig: path.to_str().unwrap(),
        out_dir: strict_out.to_str(),
        strict: true,
        json: true,
        ..GenerateArgs::default()
    };
    assert_eq!(generate::run(&strict).unwrap(), ExitCode::from(1));
    assert!(lenient_out.join("rig.rig.json").exists());
    assert!(!strict_out.join("rig.rig.json").exists());
}

#[test]
fn invalid_metarig_fails_validation() {
    let dir = MetarigDir::new();
    let metarig = Metarig::new("broken").with_bone(Bone::new("a", [0.0; 3], [0.0; 3]).with_parent("missing"));
    let path = dir.add("broken", &metarig);
    assert_eq!(validate::run(path.to_str().unwrap(), true).unwrap(), ExitCode::from(1));

    let out = dir.path("out");
    let args = GenerateArgs {
        metarig: path.to_str().unwrap(),
        out_dir: out.to_str(),
        ..GenerateArgs::default()
    };
    assert_eq!(generate::run(&args).unwrap(), ExitCode::from(1));
}
