use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];
const DEFAULT_TRIPLET: &str = "x64-windows";

fn warn(message: &str) {
    println!("cargo:warning={message}");
}

/// Where vcpkg would have installed FFmpeg, if `VCPKG_ROOT` is set.
fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| DEFAULT_TRIPLET.to_owned());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // pkg-config finds FFmpeg everywhere except Windows.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_ffmpeg_dir() {
        None => warn("FFMPEG_DIR is not set; ffmpeg-sys-next may fail to locate the FFmpeg libraries"),
        Some(dir) if dir.exists() => {
            warn(&format!("Found FFmpeg under vcpkg; set FFMPEG_DIR={} to use it", dir.display()));
            if env::var_os("VCPKGRS_DYNAMIC").is_none() {
                warn("VCPKGRS_DYNAMIC is not set; static vcpkg FFmpeg builds are assumed");
            }
        }
        Some(dir) => warn(&format!("VCPKG_ROOT is set but {} does not exist", dir.display())),
    }
}
