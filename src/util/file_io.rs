
use rustc_hash::FxHashSet as HashSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::fs::File;
use std::path::Path;

/// Helper function that loads a file into some type, helpful generic
/// # Arguments
/// * `filename` - the file path to open and parse, gzip is detected by a ".gz" extension
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::read::MultiGzDecoder::new(
                File::open(filename)?
            )
        )
    } else {
        Box::new(File::open(filename)?)
    };
    let result: T = serde_json::from_reader(BufReader::new(fp))?;
    Ok(result)
}

/// This will save a generic serializable struct to JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to, a ".gz" extension will compress the output
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file: Box<dyn std::io::Write> = if out_filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::write::GzEncoder::new(
                File::create(out_filename)?,
                flate2::Compression::best()
            )
        )
    } else {
        Box::new(File::create(out_filename)?)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// Reads a file line-by-line into a set, e.g. a list of gene names.
/// Surrounding whitespace is trimmed and blank lines are skipped.
/// # Arguments
/// * `filename` - The file to load into the hash set
/// # Errors
/// * if a file is provided but cannot be opened or read
pub fn load_file_lines(filename: &Path) -> Result<HashSet<String>, Box<dyn std::error::Error>> {
    // open the file and throw into a buffered reader
    let file = File::open(filename)?;
    let reader = BufReader::new(file);

    // now add each line
    let mut hashset: HashSet<String> = Default::default();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            hashset.insert(trimmed.to_string());
        }
    }
    Ok(hashset)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    #[test]
    fn test_json_round_trip() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let data: BTreeMap<String, Vec<u64>> = [
            ("CYP2C19".to_string(), vec![94761900, 94781859]),
            ("DPYD".to_string(), vec![97450058])
        ].into_iter().collect();

        for filename in ["data.json", "data.json.gz"] {
            let path = tmp_dir.path().join(filename);
            save_json(&data, &path).unwrap();
            let loaded: BTreeMap<String, Vec<u64>> = load_json(&path).unwrap();
            assert_eq!(loaded, data);
        }

        // the gzip one really is compressed
        let raw = std::fs::read(tmp_dir.path().join("data.json.gz")).unwrap();
        assert_eq!(&raw[0..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_load_file_lines() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let path = tmp_dir.path().join("genes.txt");
        std::fs::write(&path, "CYP2C19\n  DPYD \n\nCYP2C19\n").unwrap();

        let lines = load_file_lines(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains("CYP2C19"));
        assert!(lines.contains("DPYD"));

        assert!(load_file_lines(&tmp_dir.path().join("missing.txt")).is_err());
    }
}
