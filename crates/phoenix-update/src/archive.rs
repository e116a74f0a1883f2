//! Executable extraction from release assets
//!
//! The format is inferred from the asset name: `.zip`, `.tar.gz`/`.tgz`,
//! `.tar.xz`/`.txz`, `.tar`, `.gz`, `.xz`. Other compression suffixes are
//! rejected. A name without an archive suffix is the bare executable, unless
//! its contents start with a known compression signature.

use flate2::read::GzDecoder;
use std::error::Error as StdError;
use std::io::{Cursor, Read};
use thiserror::Error;
use tracing::debug;
use xz2::read::XzDecoder;

/// Upper bound on buffer space reserved from untrusted size hints
pub(crate) const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Suffixes of formats that cannot be extracted
const UNSUPPORTED_SUFFIXES: &[&str] = &[
    ".tar.bz2", ".tbz2", ".tbz", ".bz2", ".tar.zst", ".tzst", ".zst", ".tar.lz", ".lz", ".lz4",
    ".lzma", ".7z", ".rar", ".br",
];

/// Leading bytes of compressed or archived payloads
const SIGNATURES: &[(&str, &[u8])] = &[
    ("gzip", &[0x1f, 0x8b]),
    ("xz", &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]),
    ("zstd", &[0x28, 0xb5, 0x2f, 0xfd]),
    ("bzip2", b"BZh"),
    ("zip", b"PK\x03\x04"),
    ("7z", &[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c]),
];

/// Extraction failures
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Archive unreadable or corrupt
    #[error("release could not be decompressed ({asset}): {source}")]
    Decompression {
        asset: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Archive read fine but has no entry for the executable
    #[error("release archive does not contain the binary {executable:?} ({asset})")]
    BinaryMissing { asset: String, executable: String },
}

/// Container format of a release asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    TarXz,
    Tar,
    Gzip,
    Xz,
    /// Not an archive: the asset is the executable
    Raw,
    /// Recognised but not extractable; carries the suffix
    Unsupported(&'static str),
}

impl ArchiveFormat {
    /// Infer the format from an asset name or URL
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.ends_with(".zip") {
            Self::Zip
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::TarGz
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Self::TarXz
        } else if name.ends_with(".tar") {
            Self::Tar
        } else if name.ends_with(".gz") {
            Self::Gzip
        } else if name.ends_with(".xz") {
            Self::Xz
        } else if let Some(suffix) = UNSUPPORTED_SUFFIXES.iter().find(|s| name.ends_with(**s)) {
            Self::Unsupported(*suffix)
        } else {
            Self::Raw
        }
    }
}

/// Return the bytes of `executable` contained in `data`
///
/// `asset_name` only selects the format. Entries match on their base name,
/// with or without an `.exe` extension.
pub fn extract(data: &[u8], asset_name: &str, executable: &str) -> Result<Vec<u8>, ExtractError> {
    let format = ArchiveFormat::from_name(asset_name);
    debug!("Extracting {} from {} ({:?})", executable, asset_name, format);

    let decompression = |source: Box<dyn StdError + Send + Sync>| ExtractError::Decompression {
        asset: asset_name.to_string(),
        source,
    };

    let found = match format {
        ArchiveFormat::Raw => {
            if let Some(kind) = compression_signature(data) {
                return Err(decompression(
                    format!("{} data in an asset without an archive suffix", kind).into(),
                ));
            }
            return Ok(data.to_vec());
        }
        ArchiveFormat::Unsupported(suffix) => {
            return Err(decompression(
                format!("unsupported compression format {}", suffix).into(),
            ));
        }
        ArchiveFormat::Gzip => return decompress(GzDecoder::new(data)).map_err(decompression),
        ArchiveFormat::Xz => return decompress(XzDecoder::new(data)).map_err(decompression),
        ArchiveFormat::TarGz => find_in_tar(GzDecoder::new(data), executable),
        ArchiveFormat::TarXz => find_in_tar(XzDecoder::new(data), executable),
        ArchiveFormat::Tar => find_in_tar(data, executable),
        ArchiveFormat::Zip => find_in_zip(data, executable),
    }
    .map_err(decompression)?;

    found.ok_or_else(|| ExtractError::BinaryMissing {
        asset: asset_name.to_string(),
        executable: executable.to_string(),
    })
}

/// Buffer for `size_hint` bytes; hints come from headers and are capped
pub(crate) fn preallocated(size_hint: u64) -> Vec<u8> {
    Vec::with_capacity(size_hint.min(MAX_PREALLOCATION) as usize)
}

fn compression_signature(data: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|(_, magic)| data.starts_with(magic))
        .map(|(kind, _)| *kind)
}

type ScanResult = Result<Option<Vec<u8>>, Box<dyn StdError + Send + Sync>>;

fn decompress<R: Read>(mut reader: R) -> Result<Vec<u8>, Box<dyn StdError + Send + Sync>> {
    let mut binary = Vec::new();
    reader.read_to_end(&mut binary)?;
    Ok(binary)
}

fn find_in_tar<R: Read>(reader: R, executable: &str) -> ScanResult {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let matched = {
            let path = entry.path()?;
            matches_executable(&path.to_string_lossy(), executable)
        };
        if matched {
            let mut binary = preallocated(entry.size());
            entry.read_to_end(&mut binary)?;
            return Ok(Some(binary));
        }
    }

    Ok(None)
}

fn find_in_zip(data: &[u8], executable: &str) -> ScanResult {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if !file.is_file() || !matches_executable(file.name(), executable) {
            continue;
        }

        let mut binary = preallocated(file.size());
        file.read_to_end(&mut binary)?;
        return Ok(Some(binary));
    }

    Ok(None)
}

/// Compare the base name of an archive entry with the executable name
fn matches_executable(entry: &str, executable: &str) -> bool {
    let base = entry.rsplit(['/', '\\']).next().unwrap_or(entry);
    strip_exe(base) == strip_exe(executable)
}

fn strip_exe(name: &str) -> &str {
    match name.len().checked_sub(4) {
        Some(idx) if name.is_char_boundary(idx) && name[idx..].eq_ignore_ascii_case(".exe") => {
            &name[..idx]
        }
        _ => name,
    }
}
