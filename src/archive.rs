//! Bundles the shapefile triple into a flat zip archive for download.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::PipelineError;
use crate::sink::ShapefilePaths;

/// Write a zip archive containing exactly the three shapefile components as
/// flat entries (no directory prefix).
pub fn bundle_shapefile(paths: &ShapefilePaths, archive_path: &Path) -> Result<(), PipelineError> {
    let file = File::create(archive_path)
        .map_err(|e| PipelineError::Serialization(format!("creating {archive_path:?}: {e}")))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default();

    for part in paths.parts() {
        let name = part
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PipelineError::Serialization(format!("non-UTF-8 file name in {part:?}"))
            })?;
        zip.start_file(name, options)
            .map_err(|e| PipelineError::Serialization(format!("adding {name}: {e}")))?;
        let mut src = File::open(part)
            .map_err(|e| PipelineError::Serialization(format!("opening {part:?}: {e}")))?;
        io::copy(&mut src, &mut zip)
            .map_err(|e| PipelineError::Serialization(format!("copying {name}: {e}")))?;
    }

    zip.finish()
        .map_err(|e| PipelineError::Serialization(format!("finalizing archive: {e}")))?;
    Ok(())
}
