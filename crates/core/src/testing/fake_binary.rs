//! Shell scripts standing in for ffmpeg and ffprobe.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` script named `name` into `dir`.
///
/// Inside the script `$0` is the script path, which tests use to derive
/// side-channel files such as `"$0.pids"`.
pub fn fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake binary");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake binary");
    path
}

/// Writes a fake ffprobe that prints `json` and exits with `code`.
pub fn fake_ffprobe(dir: &Path, json: &str, code: i32) -> PathBuf {
    let data = dir.join("ffprobe.json");
    std::fs::write(&data, json).expect("write ffprobe output");
    fake_binary(
        dir,
        "ffprobe",
        &format!("cat '{}'\nexit {}", data.display(), code),
    )
}
