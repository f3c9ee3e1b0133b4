//! Writing of parsed results to structured data files.

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

/// Name of the directory, within the output directory, holding data files.
pub const DATA_DIRECTORY: &str = "scqc_data";

/// Writes `data` as pretty printed JSON to `<directory>/<tag>.json`, creating
/// the directory if needed. Returns the path written to.
pub fn write_data_file<T>(directory: &Path, tag: &str, data: &T) -> anyhow::Result<PathBuf>
where
    T: Serialize + ?Sized,
{
    fs::create_dir_all(directory)
        .with_context(|| format!("could not create directory: {}", directory.display()))?;

    let mut filepath = PathBuf::from(directory);
    filepath.push(format!("{}.json", tag));

    let output = serde_json::to_string_pretty(data)?;
    let mut file = File::create(&filepath)
        .with_context(|| format!("could not create data file: {}", filepath.display()))?;
    file.write_all(output.as_bytes())?;

    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_write_data_file() {
        let dir = TempDir::new().unwrap();
        let directory = dir.path().join(DATA_DIRECTORY);

        let data = json!({"sample2": {"b": 1}, "sample1": {"a": 2}});
        let path = write_data_file(&directory, "ontstat", &data).unwrap();
        assert_eq!(path, directory.join("ontstat.json"));

        let contents = fs::read_to_string(path).unwrap();
        let first = contents.find("sample2").unwrap();
        let second = contents.find("sample1").unwrap();
        assert!(first < second);
    }
}
