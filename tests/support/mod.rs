//! Inputs synthesized on the fly so the integration tests need no binary
//! fixtures.

#![allow(dead_code)]

use std::{fs, path::Path};

pub const Y4M_WIDTH: u32 = 4;
pub const Y4M_HEIGHT: u32 = 4;

/// Write a 4x4, 25 fps, 4:4:4 YUV4MPEG2 stream with one frame per entry of
/// `luma`. Every frame is flat grey at the given luma level.
pub fn write_y4m(path: &Path, luma: &[u8]) {
    let plane = (Y4M_WIDTH * Y4M_HEIGHT) as usize;
    let mut data = format!("YUV4MPEG2 W{Y4M_WIDTH} H{Y4M_HEIGHT} F25:1 Ip A1:1 C444\n").into_bytes();
    for &level in luma {
        data.extend_from_slice(b"FRAME\n");
        data.extend(std::iter::repeat_n(level, plane));
        data.extend(std::iter::repeat_n(128u8, plane * 2));
    }
    fs::write(path, data).expect("write y4m");
}

/// Write a short mono 16-bit PCM WAV file: a container without video.
pub fn write_wav(path: &Path) {
    let sample_rate: u32 = 8_000;
    let samples: u32 = 800;
    let data_len = samples * 2;

    let mut data = Vec::with_capacity(44 + data_len as usize);
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + data_len).to_le_bytes());
    data.extend_from_slice(b"WAVEfmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&sample_rate.to_le_bytes());
    data.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes());
    data.extend_from_slice(&16u16.to_le_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&data_len.to_le_bytes());
    data.resize(44 + data_len as usize, 0);
    fs::write(path, data).expect("write wav");
}

/// Sorted file names in `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .expect("read output directory")
        .map(|entry| entry.expect("directory entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
