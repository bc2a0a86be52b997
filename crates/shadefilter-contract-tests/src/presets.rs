use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use shadefilter_core::builtin::BuiltinShader;
use shadefilter_core::{ErrorClass, FilterError, FilterPreset, ParamValue, PixelKind, SourceImage};

use crate::recording::{filter, run, RecordingProvider};

// ---- Golden fixtures (JSON presets) ----
const PRESET_THRESHOLD_JSON: &str = include_str!("../fixtures/preset_threshold.json");
const PRESET_SHADER_PATH_JSON: &str = include_str!("../fixtures/preset_shader_path.json");
const PRESET_BAD_BUILTIN_JSON: &str = include_str!("../fixtures/preset_bad_builtin.json");
const PRESET_UNKNOWN_KEY_JSON: &str = include_str!("../fixtures/preset_unknown_key.json");
const TINT_FRAG: &str = include_str!("../fixtures/tint.frag");

fn temp_dir(name: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("shadefilter_contract_{name}_{ts}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_temp_fixture(name: &str, contents: &str) -> PathBuf {
    let p = temp_dir(name).join(format!("{name}.json"));
    fs::write(&p, contents).expect("write fixture");
    p
}

static LUMA_2X2: [u8; 4] = [0, 85, 170, 255];

#[test]
fn golden_threshold_preset_applies_its_parameter() {
    let path = write_temp_fixture("threshold", PRESET_THRESHOLD_JSON);
    let preset = FilterPreset::from_json_path(&path).expect("preset_threshold.json should parse");
    assert_eq!(preset.name.as_deref(), Some("threshold-30"));

    let provider = RecordingProvider::new();
    let f = filter(&provider);
    f.apply_preset(&preset).expect("apply");
    let src = SourceImage::luminance(2, 2, &LUMA_2X2).expect("source");
    run(&f, &src, (2, 2, PixelKind::Rgba8), 0).0.expect("frame");

    let stats = provider.stats();
    assert_eq!(stats.writes_to(stats.programs[0], "threshold"), vec![ParamValue::F1(0.3)]);
}

#[test]
fn golden_shader_path_resolves_next_to_the_preset() {
    let path = write_temp_fixture("shader_path", PRESET_SHADER_PATH_JSON);
    let dir = path.parent().expect("fixture dir");
    fs::write(dir.join("tint.frag"), TINT_FRAG).expect("write shader");

    let preset = FilterPreset::from_json_path(&path).expect("preset_shader_path.json should parse");
    let (source, params) = preset.resolve().expect("resolve");
    assert_eq!(source.frag, TINT_FRAG);
    assert_eq!(source.vert, BuiltinShader::Passthrough.vert());
    assert_eq!(
        params,
        vec![
            ("levels".to_string(), ParamValue::I1(4)),
            ("tint".to_string(), ParamValue::F2([0.25, 0.75])),
        ],
        "parameters come back in name order"
    );

    let provider = RecordingProvider::new();
    let f = filter(&provider);
    f.apply_preset(&preset).expect("apply");
    let src = SourceImage::luminance(2, 2, &LUMA_2X2).expect("source");
    run(&f, &src, (2, 2, PixelKind::Rgb565), 0).0.expect("frame");

    let stats = provider.stats();
    let p = stats.programs[0];
    assert_eq!(stats.writes_to(p, "tint"), vec![ParamValue::F2([0.25, 0.75])]);
    assert_eq!(stats.writes_to(p, "levels"), vec![ParamValue::I1(4)]);
}

#[test]
fn golden_bad_builtin_is_a_config_error_and_changes_nothing() {
    let path = write_temp_fixture("bad_builtin", PRESET_BAD_BUILTIN_JSON);
    let preset = FilterPreset::from_json_path(&path).expect("shape is valid json");

    let provider = RecordingProvider::new();
    let f = filter(&provider);
    f.set_source(BuiltinShader::Passthrough.source());

    let err = f.apply_preset(&preset).expect_err("emboss is not a builtin");
    assert!(matches!(&err, FilterError::InvalidConfig { path: p, .. } if *p == path), "{err:?}");
    assert_eq!(err.class(), ErrorClass::Config);

    // The previously configured program still serves.
    let src = SourceImage::luminance(2, 2, &LUMA_2X2).expect("source");
    let (result, out) = run(&f, &src, (2, 2, PixelKind::Rgba8), 0);
    result.expect("passthrough frame");
    assert_eq!(&out[4..8], &[85, 85, 85, 255]);
}

#[test]
fn golden_unknown_key_is_rejected_with_its_path() {
    let path = write_temp_fixture("unknown_key", PRESET_UNKNOWN_KEY_JSON);
    let err = FilterPreset::from_json_path(&path).expect_err("speed is not a preset field");
    assert!(matches!(&err, FilterError::Json { path: p, .. } if *p == path), "{err:?}");
    assert!(err.to_string().contains("unknown_key.json"));
}

#[test]
fn missing_preset_file_is_an_io_error() {
    let path = temp_dir("missing").join("nope.json");
    let err = FilterPreset::from_json_path(&path).expect_err("missing file");
    assert!(matches!(err, FilterError::Io { .. }));
    assert_eq!(err.class(), ErrorClass::Config);
}

#[test]
fn applying_a_preset_replaces_earlier_parameters() {
    let preset = FilterPreset::from_json_str(PRESET_THRESHOLD_JSON).expect("parse");
    let provider = RecordingProvider::new();
    let f = filter(&provider);
    f.set_source(BuiltinShader::Twirl.source());
    f.set_param_1f("radius", 0.25);
    f.apply_preset(&preset).expect("apply");

    let src = SourceImage::luminance(2, 2, &LUMA_2X2).expect("source");
    run(&f, &src, (2, 2, PixelKind::Rgba8), 0).0.expect("frame");

    let stats = provider.stats();
    assert!(stats.uniform_writes.iter().all(|w| w.name != "radius"));
}

#[test]
fn every_builtin_compiles_and_declares_its_default_parameters() {
    for builtin in BuiltinShader::ALL {
        let provider = RecordingProvider::new();
        let f = filter(&provider);
        f.set_source(builtin.source());
        for (name, value) in builtin.default_params() {
            f.set_param(name, value);
        }

        let src = SourceImage::luminance(2, 2, &LUMA_2X2).expect("source");
        let (result, _) = run(&f, &src, (2, 2, PixelKind::Rgba8), 0);
        result.unwrap_or_else(|e| panic!("{}: {e}", builtin.name()));

        let stats = provider.stats();
        for (name, _) in builtin.default_params() {
            assert!(
                !stats.skipped_uniforms.iter().any(|s| s == name),
                "{}: default parameter {name} is not a uniform",
                builtin.name()
            );
        }
    }
}
