use std::env;
use std::path::PathBuf;

/// Windows builds need FFmpeg located explicitly; print hints when it is not.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=stillframe: FFMPEG_DIR is not set. Install FFmpeg (e.g. via vcpkg) and point FFMPEG_DIR at it."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let ffmpeg_dir = PathBuf::from(&vcpkg_root).join("installed").join(&triplet);

    if ffmpeg_dir.exists() {
        println!(
            "cargo:warning=stillframe: found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly.",
            ffmpeg_dir.display(),
        );
    } else {
        println!(
            "cargo:warning=stillframe: VCPKG_ROOT is set but {} does not exist.",
            ffmpeg_dir.display(),
        );
    }
}
