use crate::error::Result;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes one record per line to `sink` and flushes it.
pub fn write_records<W, T>(mut sink: W, records: &[T]) -> Result<usize>
where
    W: Write,
    T: Display,
{
    for record in records {
        writeln!(sink, "{record}")?;
    }
    sink.flush()?;
    Ok(records.len())
}

/// Creates (or truncates) the output file.
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Creates `path` and writes `records` into it.
pub fn write_output_file<T: Display>(path: &Path, records: &[T]) -> Result<usize> {
    let written = write_records(create_output(path)?, records)?;
    info!("Wrote {} records to {}", written, path.display());
    Ok(written)
}
