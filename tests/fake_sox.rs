//! Drives the SoX adapter end to end against a shell script that imitates the two
//! sox invocations: `--i` prints the file's contents as the report, and a
//! conversion writes a report for the requested format to the output path.
#![cfg(unix)]

use audio_format_batch_normalize::error::{Error, ToolError};
use audio_format_batch_normalize::probe::{MetadataField, SoxInfoParser};
use audio_format_batch_normalize::tool::Sox;
use audio_format_batch_normalize::{
    NormalizationOptions, Outcome, SkipReason, TEMP_FILE_PREFIX, normalize_folder, process_files,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn report(sample_rate: u32, bit_depth: u32) -> String {
    format!(
        "Input File     : 'x.wav'\nChannels       : 2\nSample Rate    : {sample_rate}\nPrecision      : {bit_depth}-bit\nSample Encoding: {bit_depth}-bit Signed Integer PCM\n"
    )
}

fn temp_leftovers(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .starts_with(TEMP_FILE_PREFIX)
        })
        .count()
}

fn write_fake_sox(dir: &Path, log: &Path) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then echo "sox: SoX v14.4.2"; exit 0; fi
if [ "$1" = "--i" ]; then cat "$2"; exit 0; fi
src="$1"; bits="$3"; rate="$5"
for last; do :; done
if grep -q FAIL "$src"; then echo "boom" >&2; exit 2; fi
echo "$*" >> "{log}"
printf 'Sample Rate    : %s\nPrecision      : %s-bit\nSample Encoding: %s-bit Signed Integer PCM\n' "$rate" "$bits" "$bits" > "$last"
"#,
        log = log.display()
    );
    let path = dir.join("sox");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn converts_directory_with_script_sox() {
    let tools = tempfile::tempdir().unwrap();
    let log = tools.path().join("calls.log");
    let sox_path = write_fake_sox(tools.path(), &log);

    let media = tempfile::tempdir().unwrap();
    let root = media.path();
    fs::create_dir(root.join("sub")).unwrap();
    let mismatched = root.join("a.wav");
    let compliant = root.join("b.wav");
    let failing = root.join("c.wav");
    let unparsable = root.join("d.wav");
    let nested = root.join("sub/e.wav");
    fs::write(&mismatched, report(44100, 16)).unwrap();
    fs::write(&compliant, report(48000, 24)).unwrap();
    fs::write(&failing, format!("FAIL\n{}", report(44100, 16))).unwrap();
    fs::write(&unparsable, "Sample Rate    : 44100\n").unwrap();
    fs::write(&nested, report(22050, 8)).unwrap();
    fs::write(root.join("notes.txt"), "not audio").unwrap();
    // an ordinary input that happens to carry the name older versions used for output
    let user_tmp = root.join("tmp_out.wav");
    fs::write(&user_tmp, report(48000, 24)).unwrap();

    let options = NormalizationOptions {
        input_dir: root.to_path_buf(),
        sample_rate: 48000,
        bit_depth: 24,
        sox_program: sox_path.clone(),
        ..Default::default()
    };
    let sox = Sox::with_program(&sox_path);

    let reports = process_files(&options, &sox, &SoxInfoParser).unwrap();
    let paths: Vec<&Path> = reports.iter().map(|r| r.path.as_path()).collect();
    assert_eq!(
        paths,
        [
            mismatched.as_path(),
            compliant.as_path(),
            failing.as_path(),
            unparsable.as_path(),
            nested.as_path(),
            user_tmp.as_path()
        ]
    );

    assert!(matches!(reports[0].outcome, Outcome::Converted));
    assert!(matches!(reports[1].outcome, Outcome::Compliant));
    match &reports[2].outcome {
        Outcome::ConversionFailed(ToolError::Failed { stderr, .. }) => assert_eq!(stderr, "boom"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    match &reports[3].outcome {
        Outcome::Skipped(SkipReason::MissingFields(fields)) => {
            assert_eq!(fields, &vec![MetadataField::BitDepth])
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(reports[4].outcome, Outcome::Converted));
    assert!(matches!(reports[5].outcome, Outcome::Compliant));
    assert_eq!(fs::read_to_string(&user_tmp).unwrap(), report(48000, 24));

    assert_eq!(
        fs::read_to_string(&mismatched).unwrap(),
        "Sample Rate    : 48000\nPrecision      : 24-bit\nSample Encoding: 24-bit Signed Integer PCM\n"
    );
    assert!(fs::read_to_string(&failing).unwrap().starts_with("FAIL"));
    assert_eq!(temp_leftovers(root), 0);

    let calls = fs::read_to_string(&log).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert!(call.contains("-b 24 -r 48000"), "{call}");
        assert!(!call.contains("-D"), "{call}");
        let dest = Path::new(call.split_whitespace().last().unwrap());
        assert_eq!(dest.parent().unwrap(), root, "{call}");
        let name = dest.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(".wav"), "{call}");
    }

    // converted files are left alone on the next run
    let second = process_files(&options, &sox, &SoxInfoParser).unwrap();
    assert!(matches!(second[0].outcome, Outcome::Compliant));
    assert!(matches!(second[4].outcome, Outcome::Compliant));
    assert_eq!(fs::read_to_string(&log).unwrap().lines().count(), 2);

    match normalize_folder(&options) {
        Err(Error::Incomplete { failed, skipped }) => {
            assert_eq!(failed, 1);
            assert_eq!(skipped, 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    // with no dither
    fs::write(&mismatched, report(44100, 16)).unwrap();
    let no_dither = NormalizationOptions {
        no_dither: true,
        ..options.clone()
    };
    let reports = process_files(&no_dither, &sox, &SoxInfoParser).unwrap();
    assert!(matches!(reports[0].outcome, Outcome::Converted));
    let calls = fs::read_to_string(&log).unwrap();
    assert!(calls.lines().last().unwrap().contains("-b 24 -r 48000 -D"));
}
