use std::path::PathBuf;

use renderer::{AssetLoader, DirectoryAssets, FRAGMENT_SHADER_ASSET, VERTEX_SHADER_ASSET};
use viewstate::Hue;

fn bundled() -> DirectoryAssets {
    DirectoryAssets::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets"))
}

#[test]
fn every_palette_ramp_is_whole_rgba_texels() {
    let assets = bundled();
    for hue in Hue::ALL {
        let bytes = assets.load_bytes(hue.asset_name()).unwrap();
        assert!(!bytes.is_empty(), "{hue} ramp is empty");
        assert_eq!(bytes.len() % 4, 0, "{hue} ramp is not RGBA8");
        assert!(bytes.len() / 4 <= 2048, "{hue} ramp exceeds the minimum texture limit");
    }
}

#[test]
fn shaders_declare_the_fractal_contract() {
    let assets = bundled();
    let vertex = assets.load_text(VERTEX_SHADER_ASSET).unwrap();
    assert!(vertex.contains("void main"));

    let fragment = assets.load_text(FRAGMENT_SHADER_ASSET).unwrap();
    for name in [
        "FractalParams",
        "gaussianPosition",
        "gaussianHalfFrame",
        "iterations",
        "hueTexture",
    ] {
        assert!(fragment.contains(name), "fragment shader lacks {name}");
    }
}
