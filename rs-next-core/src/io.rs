use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Reads a whole corpus file into memory.
///
/// - The file is expected to be UTF-8; a leading byte-order mark is kept here
///   and removed later by the normalizer.
/// - A missing file is reported as `Error::CorpusNotFound`, any other failure
///   as `Error::Io`.
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> Result<String> {
	let path = filename.as_ref();
	match fs::read_to_string(path) {
		Ok(contents) => Ok(contents),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::CorpusNotFound(path.to_path_buf())),
		Err(e) => Err(Error::Io(e)),
	}
}

/// Builds an output path from an input file name, an output folder and a new extension.
///
/// Example:
/// `data/sherlock.txt` + `out` + `"vocab"` → `out/sherlock.vocab`
pub fn build_output_path<P: AsRef<Path>, D: AsRef<Path>>(
	input_path: P,
	output_dir: D,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let mut output = output_dir.as_ref().to_path_buf();
	output.push(get_filename(input_path)?);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/sherlock.txt"` → `"sherlock"`
/// - `"sherlock.txt"` → `"sherlock"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Writes `bytes` to `path` atomically.
///
/// The data goes to a temporary file in the target directory first and is
/// then persisted over `path`, so a crash never leaves a half-written artifact.
/// Missing parent directories are created.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
	let path = path.as_ref();
	let parent = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};
	fs::create_dir_all(parent)?;

	let mut temp_file = NamedTempFile::new_in(parent)?;
	temp_file.write_all(bytes)?;
	temp_file.flush()?;
	temp_file.persist(path).map_err(|e| Error::Io(e.error))?;
	Ok(())
}

/// Deletes `path` if it exists.
///
/// # Returns
/// `true` if a file was removed, `false` if there was nothing to remove.
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
	match fs::remove_file(path) {
		Ok(()) => Ok(true),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
		Err(e) => Err(Error::Io(e)),
	}
}
