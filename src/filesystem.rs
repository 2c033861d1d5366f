//! File metadata and HTTP serving headers.

use crate::errors::{JaxpError, Result};
use log::debug;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

fn mime_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" | "rss" => "application/xml",
        "txt" | "text" | "conf" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "swf" => "application/x-shockwave-flash",
        "mp3" => "audio/mpeg",
        "flv" => "video/x-flv",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => DEFAULT_MIME_TYPE,
    }
}

/// A file on disk, described the way it is served over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// File name without extension.
    pub name: String,
    pub extension: String,
    pub mime_type: String,
    pub dir_path: PathBuf,
    pub size: u64,
    pub url: PathBuf,
}

impl FileDescriptor {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(JaxpError::invalid_argument(&format!(
                "{} is not a file",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            mime_type: mime_type_for(&extension).to_string(),
            extension,
            dir_path: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            size: metadata.len(),
            url: path.to_path_buf(),
        })
    }

    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }

    /// Hex MD5 of the current contents.
    pub fn md5(&self) -> Result<String> {
        let mut file = File::open(&self.url)?;
        let mut context = md5::Context::new();
        io::copy(&mut file, &mut context)?;
        Ok(hex::encode(context.compute().as_ref()))
    }

    /// Headers to send before the body, in order.
    pub fn http_headers(&self, as_download: bool) -> Result<Vec<(&'static str, String)>> {
        let disposition = if as_download {
            format!("attachment; filename=\"{}\"", self.file_name())
        } else {
            "inline".to_string()
        };
        Ok(vec![
            ("Content-Type", self.mime_type.clone()),
            ("Content-Disposition", disposition),
            ("Content-Length", self.size.to_string()),
            ("Content-MD5", self.md5()?),
        ])
    }

    /// Streams the file into `writer`; returns the bytes written.
    pub fn copy_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<u64> {
        let mut file = File::open(&self.url)?;
        let written = io::copy(&mut file, writer)?;
        debug!("served {} ({} bytes)", self.url.display(), written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_open_describes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(&dir, "banner.PNG", b"not really a png");

        let file = FileDescriptor::open(&path).unwrap();
        assert_eq!(file.name, "banner");
        assert_eq!(file.extension, "PNG");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.dir_path, dir.path());
        assert_eq!(file.size, 16);
        assert_eq!(file.url, path);
        assert_eq!(file.file_name(), "banner.PNG");
    }

    #[test]
    fn test_unknown_extension_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileDescriptor::open(sample(&dir, "notes", b"x")).unwrap();
        assert_eq!(file.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(file.file_name(), "notes");

        assert!(matches!(
            FileDescriptor::open(dir.path().join("absent.txt")),
            Err(JaxpError::Io(_))
        ));
        assert!(matches!(
            FileDescriptor::open(dir.path()),
            Err(JaxpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_http_headers() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileDescriptor::open(sample(&dir, "report.pdf", b"hello")).unwrap();

        let inline = file.http_headers(false).unwrap();
        assert_eq!(
            inline,
            vec![
                ("Content-Type", "application/pdf".to_string()),
                ("Content-Disposition", "inline".to_string()),
                ("Content-Length", "5".to_string()),
                ("Content-MD5", "5d41402abc4b2a76b9719d911017c592".to_string()),
            ]
        );

        let download = file.http_headers(true).unwrap();
        assert_eq!(download[1].1, "attachment; filename=\"report.pdf\"");
    }

    #[test]
    fn test_copy_to() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileDescriptor::open(sample(&dir, "page.html", b"<p>hi</p>")).unwrap();
        let mut out = Vec::new();
        assert_eq!(file.copy_to(&mut out).unwrap(), 9);
        assert_eq!(out, b"<p>hi</p>");
    }
}
