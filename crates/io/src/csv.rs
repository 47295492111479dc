// CSV/TSV import/export

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cellgrid_engine::{CapacityPolicy, GridError, SparseGrid};

/// Field delimiter for delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Pick from the file extension, else sniff the content (comma when unsure).
    #[default]
    Auto,
    Comma,
    Tab,
    Semicolon,
    Pipe,
}

impl Delimiter {
    /// The byte for an explicit delimiter. `Auto` has none.
    pub fn byte(self) -> Option<u8> {
        match self {
            Delimiter::Auto => None,
            Delimiter::Comma => Some(b','),
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Semicolon => Some(b';'),
            Delimiter::Pipe => Some(b'|'),
        }
    }

    /// Delimiter implied by a file extension, if it implies one.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Delimiter::Comma),
            "tsv" | "tab" => Some(Delimiter::Tab),
            "psv" => Some(Delimiter::Pipe),
            _ => None,
        }
    }
}

/// Options for the codec and the file boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CsvOptions {
    pub delimiter: Delimiter,
    /// Decode non-UTF-8 files as Windows-1252 instead of rejecting them.
    pub legacy_encoding: bool,
    /// Capacity policy of decoded grids.
    pub policy: CapacityPolicy,
}

/// Parse delimited text into a grid.
///
/// Rows are text rows (an embedded line break in a quoted field does not start a
/// row, a final line terminator does not add one). The column count is the widest
/// row; shorter rows read back as empty cells.
pub fn decode(text: &str, delimiter: u8, policy: CapacityPolicy) -> Result<SparseGrid, GridError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    // Build with Grow, then pin the extent to what was read.
    let mut grid = SparseGrid::with_policy(0, 0, CapacityPolicy::Grow);
    let mut record = csv::StringRecord::new();
    let mut row_idx = 0usize;
    let mut max_cols = 0usize;
    // Byte just past the previous record's last non-terminator byte
    let mut gap_start = 0usize;
    // Line breaks expected between records; none before the first
    let mut separator = 0usize;

    loop {
        let start = reader.position().byte() as usize;
        let more = reader
            .read_record(&mut record)
            .map_err(|e| GridError::MalformedInput(e.to_string()))?;
        if !more {
            break;
        }
        let end = reader.position().byte() as usize;
        let raw = text.get(start..end).unwrap_or_default();

        // The reader skips blank lines. Every line break between two records beyond
        // the first one is an empty row.
        let content_start = start + (raw.len() - raw.trim_start_matches(is_line_break).len());
        let breaks = count_line_breaks(text.get(gap_start..content_start).unwrap_or_default());
        row_idx += breaks.saturating_sub(separator);
        gap_start = start + raw.trim_end_matches(is_line_break).len();
        separator = 1;

        // A quote left open swallows the rest of the input, so only the final
        // record can carry one.
        if end == text.len() {
            let last = text.get(content_start..).unwrap_or_default();
            if let Some(offset) = open_quote(last, delimiter) {
                let line = count_line_breaks(text.get(..content_start + offset).unwrap_or_default()) + 1;
                return Err(GridError::MalformedInput(format!(
                    "unterminated quoted field starting on line {line}"
                )));
            }
        }

        for (col_idx, field) in record.iter().enumerate() {
            if !field.is_empty() {
                grid.set(row_idx, col_idx, field)?;
            }
        }
        max_cols = max_cols.max(record.len());
        row_idx += 1;
    }

    grid.resize(row_idx, max_cols);
    grid.set_policy(policy);
    log::debug!("decoded {row_idx}x{max_cols} grid, {} populated", grid.populated_count());
    Ok(grid)
}

/// Render the full declared extent, one record per row, no trailing-cell trimming.
///
/// A grid with zero columns has no representable rows and encodes to "".
pub fn encode(grid: &SparseGrid, delimiter: u8) -> Result<String, GridError> {
    if grid.cols() == 0 {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in 0..grid.rows() {
        writer
            .write_record((0..grid.cols()).map(|col| grid.get(row, col)))
            .map_err(|e| GridError::Io(e.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|e| GridError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GridError::MalformedInput(e.to_string()))
}

/// Read and decode a file. The caller's grid is untouched on failure because
/// nothing is returned until decoding succeeds.
pub fn import(path: &Path, options: &CsvOptions) -> Result<SparseGrid, GridError> {
    let content = read_file_as_utf8(path, options.legacy_encoding)?;
    let delimiter = match options.delimiter.byte() {
        Some(d) => d,
        None => Delimiter::from_extension(path)
            .and_then(Delimiter::byte)
            .filter(|&d| d != b',')
            .unwrap_or_else(|| sniff_delimiter(&content)),
    };
    let grid = decode(&content, delimiter, options.policy)?;
    log::info!(
        "imported {} ({}x{}, {} populated)",
        path.display(),
        grid.rows(),
        grid.cols(),
        grid.populated_count()
    );
    Ok(grid)
}

/// Encode the whole grid and write it atomically.
///
/// Encoding finishes in memory first, then the text goes to a temporary file in the
/// target directory which is renamed over `path`. A failure at any step leaves the
/// previous file as it was.
pub fn export(grid: &SparseGrid, path: &Path, options: &CsvOptions) -> Result<(), GridError> {
    let delimiter = options
        .delimiter
        .byte()
        .or_else(|| Delimiter::from_extension(path).and_then(Delimiter::byte))
        .unwrap_or(b',');
    let text = encode(grid, delimiter)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |e: std::io::Error| GridError::Io(format!("{}: {e}", path.display()));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(text.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    log::info!("exported {} ({}x{})", path.display(), grid.rows(), grid.cols());
    Ok(())
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read a file as text. Invalid UTF-8 is rejected unless `legacy` allows a
/// Windows-1252 fallback (common for Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path, legacy: bool) -> Result<String, GridError> {
    let bytes = std::fs::read(path).map_err(|e| GridError::Io(format!("{}: {e}", path.display())))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) if legacy => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
        Err(e) => Err(GridError::MalformedInput(format!(
            "{} is not valid UTF-8 (byte {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))),
    }
}

fn is_line_break(c: char) -> bool {
    c == '\r' || c == '\n'
}

/// Line breaks in `text`, counting "\r\n" once.
fn count_line_breaks(text: &str) -> usize {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n')))
        .count()
}

/// Offset of a quoted field in `record` that is still open at the end of it.
fn open_quote(record: &str, delimiter: u8) -> Option<usize> {
    let bytes = record.as_bytes();
    let mut open = None;
    let mut field_start = true;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if open.is_some() {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    open = None;
                }
            }
        } else {
            if b == b'"' && field_start {
                open = Some(i);
            }
            field_start = b == delimiter;
        }
        i += 1;
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn decode_comma(text: &str) -> SparseGrid {
        decode(text, b',', CapacityPolicy::Strict).unwrap()
    }

    #[test]
    fn test_decode_quoted_and_ragged() {
        let grid = decode_comma("a,\"b,c\"\nd\n");
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
        assert_eq!(grid.get(0, 0), "a");
        assert_eq!(grid.get(0, 1), "b,c");
        assert_eq!(grid.get(1, 0), "d");
        assert_eq!(grid.get(1, 1), "");
    }

    #[test]
    fn test_decode_doubled_quote_and_line_break() {
        let grid = decode_comma("\"say \"\"hi\"\"\",\"two\nlines\"\nnext\n");
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.get(0, 0), "say \"hi\"");
        assert_eq!(grid.get(0, 1), "two\nlines");
        assert_eq!(grid.get(1, 0), "next");
    }

    #[test]
    fn test_decode_without_trailing_newline() {
        let grid = decode_comma("a,b\nc,d");
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
        assert_eq!(grid.get(1, 1), "d");
    }

    #[test]
    fn test_decode_keeps_blank_interior_lines() {
        let grid = decode_comma("a\n\n\nb\n");
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.get(0, 0), "a");
        assert_eq!(grid.get(3, 0), "b");
    }

    #[test]
    fn test_decode_blank_line_after_multiline_field() {
        let grid = decode_comma("\"x\ny\"\n\nz\n");
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.get(0, 0), "x\ny");
        assert_eq!(grid.get(1, 0), "");
        assert_eq!(grid.get(2, 0), "z");
    }

    #[test]
    fn test_decode_crlf_blank_lines() {
        let grid = decode_comma("a,b\r\n\r\nc,\"x\r\ny\"\r\n");
        assert_eq!((grid.rows(), grid.cols()), (3, 2));
        assert_eq!(grid.get(0, 1), "b");
        assert_eq!(grid.get(1, 0), "");
        assert_eq!(grid.get(2, 0), "c");
        assert_eq!(grid.get(2, 1), "x\r\ny");
    }

    #[test]
    fn test_decode_leading_and_trailing_blank_lines() {
        let grid = decode_comma("\n\na\n\n\n");
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.get(2, 0), "a");

        assert_eq!(decode_comma("\n\n").rows(), 0);
    }

    #[test]
    fn test_decode_empty_input() {
        let grid = decode_comma("");
        assert_eq!((grid.rows(), grid.cols()), (0, 0));
    }

    #[test]
    fn test_decode_strips_bom() {
        let grid = decode_comma("\u{feff}name,age\n");
        assert_eq!(grid.get(0, 0), "name");
    }

    #[test]
    fn test_decode_unterminated_quote() {
        let err = decode("a,b\nc,\"open\nstill open\n", b',', CapacityPolicy::Strict).unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
        assert!(err.to_string().contains("line 2"), "got: {err}");
    }

    #[test]
    fn test_decode_unterminated_quote_in_single_record() {
        let err = decode("\"never closed, \"\"really\"\"", b',', CapacityPolicy::Strict).unwrap_err();
        assert!(err.to_string().contains("line 1"), "got: {err}");

        // Closed at end of input without a trailing newline is fine
        let grid = decode_comma("x,\"closed \"\"here\"\"\"");
        assert_eq!(grid.get(0, 1), "closed \"here\"");
    }

    #[test]
    fn test_decode_mid_field_quote_is_literal() {
        let grid = decode_comma("ab\"c,d\n");
        assert_eq!(grid.get(0, 0), "ab\"c");
        assert_eq!(grid.get(0, 1), "d");
    }

    #[test]
    fn test_decode_applies_policy() {
        let grid = decode("a\n", b',', CapacityPolicy::Grow).unwrap();
        assert_eq!(grid.policy(), CapacityPolicy::Grow);
    }

    #[test]
    fn test_encode_pads_rows_and_quotes() {
        let mut grid = SparseGrid::new(3, 3);
        grid.set(0, 0, "a").unwrap();
        grid.set(0, 1, "b,c").unwrap();
        grid.set(1, 2, "say \"hi\"").unwrap();
        grid.set(2, 0, "two\nlines").unwrap();

        let text = encode(&grid, b',').unwrap();
        assert_eq!(text, "a,\"b,c\",\n,,\"say \"\"hi\"\"\"\n\"two\nlines\",,\n");
    }

    #[test]
    fn test_encode_single_column_blank_row() {
        let mut grid = SparseGrid::new(3, 1);
        grid.set(0, 0, "a").unwrap();
        grid.set(2, 0, "c").unwrap();

        let back = decode_comma(&encode(&grid, b',').unwrap());
        assert_eq!((back.rows(), back.cols()), (3, 1));
        assert_eq!(back.get(2, 0), "c");
    }

    #[test]
    fn test_round_trip_preserves_extent() {
        let mut grid = SparseGrid::new(4, 3);
        grid.set(0, 2, "top right").unwrap();
        grid.set(3, 0, "bottom left").unwrap();
        grid.set(1, 1, "semi;colon|pipe").unwrap();

        for delim in [b',', b'\t', b';', b'|'] {
            let back = decode(&encode(&grid, delim).unwrap(), delim, CapacityPolicy::Strict).unwrap();
            assert_eq!(back, grid, "delimiter {}", delim as char);
        }
    }

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_single_column_defaults_to_comma() {
        assert_eq!(sniff_delimiter("one\ntwo\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_import_sniffs_semicolons() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "Name;Age;City\nAlice;30;Paris\n").unwrap();

        let grid = import(&path, &CsvOptions::default()).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 3));
        assert_eq!(grid.get(1, 2), "Paris");
    }

    #[test]
    fn test_import_explicit_delimiter_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "a;b,c\n").unwrap();

        let grid = import(&path, &CsvOptions { delimiter: Delimiter::Comma, ..CsvOptions::default() }).unwrap();
        assert_eq!(grid.get(0, 0), "a;b");
        assert_eq!(grid.get(0, 1), "c");
    }

    #[test]
    fn test_import_missing_file_is_io_failure() {
        let dir = tempdir().unwrap();
        let err = import(&dir.path().join("nope.csv"), &CsvOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "io_failure");
    }

    #[test]
    fn test_import_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        fs::write(&path, b"caf\xe9,ok\n").unwrap();

        let err = import(&path, &CsvOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "malformed_input");

        let options = CsvOptions { legacy_encoding: true, ..CsvOptions::default() };
        let grid = import(&path, &options).unwrap();
        assert_eq!(grid.get(0, 0), "café");
    }

    #[test]
    fn test_tsv_roundtrip_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.tsv");

        let mut grid = SparseGrid::new(3, 2);
        grid.set(0, 0, "Name").unwrap();
        grid.set(0, 1, "Value").unwrap();
        grid.set(1, 0, "Alice, A.").unwrap();
        grid.set(2, 1, "17").unwrap();

        export(&grid, &path, &CsvOptions::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\t'), "TSV should contain tab characters");
        assert!(content.contains("Alice, A."), "commas need no quoting in TSV");

        let imported = import(&path, &CsvOptions::default()).unwrap();
        assert_eq!(imported, grid);
    }

    #[test]
    fn test_export_failure_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let missing_dir = dir.path().join("missing").join("out.csv");
        let grid = SparseGrid::new(1, 1);
        let err = export(&grid, &missing_dir, &CsvOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "io_failure");

        // A target whose parent is a file cannot be written; the sibling file is untouched
        let target = dir.path().join("keep.csv");
        fs::write(&target, "old\n").unwrap();
        let as_dir = dir.path().join("keep.csv").join("child.csv");
        assert!(export(&grid, &as_dir, &CsvOptions::default()).is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old\n");
    }

    #[test]
    fn test_export_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale,content,here\n").unwrap();

        let mut grid = SparseGrid::new(1, 2);
        grid.set(0, 0, "fresh").unwrap();
        export(&grid, &path, &CsvOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh,\n");
    }
}
