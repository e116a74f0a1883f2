//! Release archive and validation file fixtures

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};

use super::constants::*;

/// `tar.gz` holding `binary` as `phoenix` inside a versioned directory
pub fn release_archive(binary: &[u8]) -> Vec<u8> {
    let executable = format!("phoenix-release/{}", EXECUTABLE_NAME);
    tar_gz(&[
        ("phoenix-release/README.md", b"Phoenix CLI".as_slice()),
        (executable.as_str(), binary),
    ])
}

pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn tar_xz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(xz2::write::XzEncoder::new(Vec::new(), 6));
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in entries {
        writer
            .start_file(*path, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Hex SHA256 of `data`
pub fn digest_of(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Validation file in `sha256sum` layout
pub fn validation_file(digest: &str, asset_name: &str) -> Vec<u8> {
    format!("{}  {}\n", digest, asset_name).into_bytes()
}
