use std::fs::File;
use std::io::{BufWriter, Read, Write};
use tempfile::TempPath;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{GalleryError, Result};
use crate::select::SourceFile;

/// Bytes copied per read; memory use does not grow with file size
pub const ZIP_BUFFER_SIZE: usize = 2048;

/// Zip `files` into a temporary archive, one entry per file under its base name
///
/// Entries are written in iteration order. The archive is deleted when the
/// returned [`TempPath`] is dropped; on error nothing is left behind.
pub fn create_archive(files: &[SourceFile]) -> Result<TempPath> {
    info!("Zipping {} files", files.len());

    let failed = |e: &dyn std::fmt::Display| GalleryError::ArchiveWriteFailed(e.to_string());

    let tmp = tempfile::Builder::new()
        .prefix("images")
        .suffix(".zip")
        .tempfile()
        .map_err(|e| failed(&e))?;

    {
        let mut zip = ZipWriter::new(BufWriter::new(tmp.as_file()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut buffer = [0u8; ZIP_BUFFER_SIZE];

        for file in files {
            debug!("Adding {} to archive", file.name);
            zip.start_file(file.name.as_str(), options)
                .map_err(|e| failed(&e))?;

            let mut source = File::open(&file.path)
                .map_err(|e| failed(&format!("{}: {}", file.path.display(), e)))?;
            loop {
                let count = source
                    .read(&mut buffer)
                    .map_err(|e| failed(&format!("{}: {}", file.path.display(), e)))?;
                if count == 0 {
                    break;
                }
                zip.write_all(&buffer[..count]).map_err(|e| failed(&e))?;
            }
        }

        let mut writer = zip.finish().map_err(|e| failed(&e))?;
        writer.flush().map_err(|e| failed(&e))?;
    }

    Ok(tmp.into_temp_path())
}
