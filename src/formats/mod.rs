//! Content-type detection and output path planning
//!
//! Pure lookups: file extension to MIME identifier and back, plus the
//! output-path rules for single-file and batch conversions. Detection
//! consults `mime_guess` first and falls back to a hand-maintained table,
//! so both functions are total.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Identifier used when an extension or format is unrecognized.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension used when no mapping exists for a target format.
pub const FALLBACK_EXTENSION: &str = ".out";

/// Formats probed pairwise by `--list-formats`.
pub const COMMON_FORMATS: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/html",
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/bmp",
    "audio/mp3",
    "audio/wav",
    "video/mp4",
    "application/zip",
    "application/json",
    "application/xml",
    "text/csv",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

// Extensions mime_guess has no (or an inconvenient) answer for.
const EXTENSION_TO_FORMAT: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
];

// Checked before the mime_guess reverse lookup so common formats map to a
// deterministic extension (image/jpeg is always .jpg, never .jpe).
const FORMAT_TO_EXTENSION: &[(&str, &str)] = &[
    ("text/plain", ".txt"),
    ("text/markdown", ".md"),
    ("text/html", ".html"),
    ("text/csv", ".csv"),
    ("application/json", ".json"),
    ("application/xml", ".xml"),
    ("application/pdf", ".pdf"),
    ("application/zip", ".zip"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/bmp", ".bmp"),
    ("image/svg+xml", ".svg"),
    ("audio/mpeg", ".mp3"),
    ("audio/mp3", ".mp3"),
    ("audio/wav", ".wav"),
    ("audio/x-wav", ".wav"),
    ("video/mp4", ".mp4"),
    ("video/x-msvideo", ".avi"),
];

/// Detect the content type of a file from its extension.
///
/// Falls back to [`OCTET_STREAM`] for unrecognized extensions; never fails.
pub fn detect(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    if let Some(ext) = ext {
        if let Some((_, format)) = EXTENSION_TO_FORMAT.iter().find(|(e, _)| *e == ext) {
            return (*format).to_string();
        }
    }

    OCTET_STREAM.to_string()
}

/// Map a content type back to a file extension (with leading dot).
///
/// Falls back to [`FALLBACK_EXTENSION`] when no mapping exists; never fails.
pub fn extension_for(format: &str) -> String {
    if let Some((_, ext)) = FORMAT_TO_EXTENSION.iter().find(|(f, _)| *f == format) {
        return (*ext).to_string();
    }

    if let Some(exts) = mime_guess::get_mime_extensions_str(format) {
        if let Some(ext) = exts.first() {
            return format!(".{ext}");
        }
    }

    FALLBACK_EXTENSION.to_string()
}

/// Plan the output path for one input file.
///
/// Single-file conversions use the caller's target path verbatim. Batch
/// conversions treat the target as a directory and name each output
/// `<input-stem><extension_for(target_format)>`; a batch target that itself
/// carries an extension names the directory by its stem.
pub fn plan_output_path(
    input: &Path,
    output_target: &Path,
    target_format: &str,
    is_batch: bool,
) -> PathBuf {
    if !is_batch {
        return output_target.to_path_buf();
    }

    let output_dir = if output_target.extension().is_some() {
        let stem = output_target
            .file_stem()
            .map(PathBuf::from)
            .unwrap_or_else(|| output_target.to_path_buf());
        match output_target.parent() {
            Some(parent) => parent.join(stem),
            None => stem,
        }
    } else {
        output_target.to_path_buf()
    };

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_dir.join(format!("{}{}", stem, extension_for(target_format)))
}

/// Collect the input files for a conversion run.
///
/// A file path yields itself. A directory is walked recursively; when
/// `filter_format` is given only files detecting as that type are kept.
/// Results are sorted for a stable batch order.
pub fn collect_input_files(input: &Path, filter_format: Option<&str>) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    if !input.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| filter_format.map_or(true, |format| detect(path) == format))
        .collect();
    files.sort();
    files
}

/// Display name for a content type in `--list-formats` output.
pub fn friendly_name(format: &str) -> &str {
    match format {
        "text/plain" => "Plain Text",
        "text/markdown" => "Markdown",
        "text/html" => "HTML",
        "text/csv" => "CSV",
        "application/pdf" => "PDF",
        "application/json" => "JSON",
        "application/xml" => "XML",
        "application/zip" => "ZIP Archive",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            "Word Document"
        }
        "image/png" => "PNG Image",
        "image/jpeg" => "JPEG Image",
        "image/gif" => "GIF Image",
        "image/bmp" => "BMP Image",
        "audio/mp3" => "MP3 Audio",
        "audio/mpeg" => "MP3 Audio",
        "audio/wav" => "WAV Audio",
        "video/mp4" => "MP4 Video",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_common_extensions() {
        assert_eq!(detect(Path::new("notes.txt")), "text/plain");
        assert_eq!(detect(Path::new("readme.md")), "text/markdown");
        assert_eq!(detect(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(detect(Path::new("report.pdf")), "application/pdf");
    }

    #[test]
    fn test_detect_unknown_extension_falls_back() {
        assert_eq!(detect(Path::new("blob.zzz9")), OCTET_STREAM);
        assert_eq!(detect(Path::new("no_extension")), OCTET_STREAM);
    }

    #[test]
    fn test_extension_round_trip() {
        // extension_for(detect(.e)) must map back to an equivalent format;
        // many-to-one collisions (.jpeg -> .jpg) still detect identically.
        for ext in ["txt", "md", "html", "csv", "json", "pdf", "png", "jpg", "jpeg", "gif"] {
            let format = detect(Path::new(&format!("file.{ext}")));
            let back = extension_for(&format);
            assert_ne!(back, FALLBACK_EXTENSION, "no mapping for {format}");
            let redetected = detect(Path::new(&format!("file{back}")));
            assert_eq!(redetected, format, "round trip broke for .{ext}");
        }
    }

    #[test]
    fn test_extension_for_unknown_format() {
        assert_eq!(extension_for("application/x-never-heard-of-it"), ".out");
    }

    #[test]
    fn test_plan_output_path_single_file_is_verbatim() {
        let path = plan_output_path(
            Path::new("docs/a.txt"),
            Path::new("out/converted.pdf"),
            "application/pdf",
            false,
        );
        assert_eq!(path, PathBuf::from("out/converted.pdf"));
    }

    #[test]
    fn test_plan_output_path_batch_uses_directory_and_stem() {
        let path = plan_output_path(
            Path::new("docs/chapter1.txt"),
            Path::new("converted"),
            "text/markdown",
            true,
        );
        assert_eq!(path, PathBuf::from("converted/chapter1.md"));
    }

    #[test]
    fn test_plan_output_path_batch_target_with_extension() {
        let path = plan_output_path(
            Path::new("docs/chapter1.txt"),
            Path::new("out/result.pdf"),
            "application/pdf",
            true,
        );
        assert_eq!(path, PathBuf::from("out/result/chapter1.pdf"));
    }

    #[test]
    fn test_plan_output_path_unknown_target_format() {
        let path = plan_output_path(
            Path::new("a.bin"),
            Path::new("outdir"),
            "application/x-mystery",
            true,
        );
        assert_eq!(path, PathBuf::from("outdir/a.out"));
    }

    #[test]
    fn test_collect_input_files_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("one.txt");
        fs::write(&file, "x").unwrap();
        assert_eq!(collect_input_files(&file, None), vec![file]);
    }

    #[test]
    fn test_collect_input_files_directory_with_filter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        fs::write(dir.path().join("b.md"), "x").unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.txt"), "x").unwrap();

        let all = collect_input_files(dir.path(), None);
        assert_eq!(all.len(), 3);

        let plain = collect_input_files(dir.path(), Some("text/plain"));
        assert_eq!(plain.len(), 2);
        assert!(plain.iter().all(|p| detect(p) == "text/plain"));
    }

    #[test]
    fn test_collect_input_files_missing_path() {
        assert!(collect_input_files(Path::new("/nonexistent/nowhere"), None).is_empty());
    }

    #[test]
    fn test_friendly_name_defaults_to_identifier() {
        assert_eq!(friendly_name("text/plain"), "Plain Text");
        assert_eq!(friendly_name("application/x-custom"), "application/x-custom");
    }
}
