//! TWBX packaging: the workbook document plus extract payloads in one
//! deflate-compressed zip archive.

use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::Workbook;
use crate::EncodeError;

/// One extract payload and its path inside the archive.
///
/// Extract bytes are produced elsewhere; packaging only places them. The
/// archive path must match the `extract_path` of the datasource that
/// references it, or the consuming application reports a broken connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractPart {
    pub archive_path: String,
    pub bytes: Vec<u8>,
}

impl ExtractPart {
    pub fn from_bytes(archive_path: impl Into<String>, bytes: Vec<u8>) -> Self {
        ExtractPart {
            archive_path: archive_path.into(),
            bytes,
        }
    }

    /// Read an extract file from disk for packaging.
    pub fn from_file(
        archive_path: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> io::Result<Self> {
        Ok(ExtractPart {
            archive_path: archive_path.into(),
            bytes: std::fs::read(path)?,
        })
    }
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Write a packaged workbook archive to `path`.
pub fn write_twbx(
    workbook: &Workbook,
    extracts: &[ExtractPart],
    path: impl AsRef<Path>,
) -> Result<(), PackageError> {
    let file = BufWriter::new(File::create(path)?);
    write_twbx_to_writer(workbook, extracts, file)
}

/// Write a packaged workbook archive to any seekable writer.
///
/// The workbook document is always the first entry, named `workbook.twb`;
/// extract entries follow in the given order.
pub fn write_twbx_to_writer<W: Write + Seek>(
    workbook: &Workbook,
    extracts: &[ExtractPart],
    writer: W,
) -> Result<(), PackageError> {
    let xml = workbook.to_xml()?;
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("workbook.twb", options)?;
    zip.write_all(xml.as_bytes())?;

    for extract in extracts {
        zip.start_file(&extract.archive_path, options)?;
        zip.write_all(&extract.bytes)?;
    }

    zip.finish()?;
    Ok(())
}
