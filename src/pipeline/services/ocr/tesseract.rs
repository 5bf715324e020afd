use crate::common::RasterImage;
use crate::config::OcrSettings;
use crate::error::OcrError;
use crate::pipeline::services::analysis::OcrEngine;
use crate::pipeline::types::ExtractionConfig;
use once_cell::sync::OnceCell;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

#[cfg(windows)]
const EXECUTABLE: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE: &str = "tesseract";

const WELL_KNOWN_LOCATIONS: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    "/opt/local/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

/// OCR through the `tesseract` executable; the image goes in as PNG on stdin.
pub struct TesseractCli {
    command: Option<PathBuf>,
    available: OnceCell<bool>,
}

impl TesseractCli {
    pub fn new(command: Option<PathBuf>) -> Self {
        Self {
            command,
            available: OnceCell::new(),
        }
    }

    /// Configured command first, then `PATH`, extra paths and well-known locations.
    pub fn discover(settings: &OcrSettings) -> Self {
        let candidates = candidate_paths(
            settings.tesseract_cmd.as_deref(),
            std::env::var_os("PATH"),
            &settings.extra_search_paths,
        );

        let command = first_existing(&candidates);
        match &command {
            Some(path) => info!("Using tesseract at {}", path.display()),
            None => warn!("tesseract executable not found; OCR disabled"),
        }

        Self::new(command)
    }

    pub fn command(&self) -> Option<&Path> {
        self.command.as_deref()
    }

    pub fn version(&self) -> Result<String, OcrError> {
        let command = self.require_command()?;
        let output = Command::new(command).arg("--version").output()?;
        if !output.status.success() {
            return Err(OcrError::Failed(format!(
                "{} --version exited with {}",
                command.display(),
                output.status
            )));
        }

        // Older releases print the banner on stderr.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| OcrError::Failed("empty version banner".to_string()))
    }

    fn require_command(&self) -> Result<&Path, OcrError> {
        self.command
            .as_deref()
            .ok_or_else(|| OcrError::EngineMissing(EXECUTABLE.to_string()))
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &RasterImage, config: &ExtractionConfig) -> Result<String, OcrError> {
        let command = self.require_command()?;
        let png = image.encode_png()?;

        let mut child = Command::new(command)
            .arg("stdin")
            .arg("stdout")
            .arg("--psm")
            .arg(config.mode.psm().to_string())
            .arg("-l")
            .arg(config.language_spec())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Failed("tesseract stdin unavailable".to_string()))?;
        // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us.
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| OcrError::Failed("stdin writer panicked".to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(&stderr, config));
        }
        written?;

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("tesseract {} returned {} chars", config, text.len());
        Ok(text)
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| match self.version() {
            Ok(version) => {
                debug!("tesseract available: {}", version);
                true
            }
            Err(e) => {
                warn!("tesseract version check failed: {}", e);
                false
            }
        })
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

fn classify_failure(stderr: &str, config: &ExtractionConfig) -> OcrError {
    if stderr.contains("Failed loading language") || stderr.contains("Error opening data file") {
        OcrError::Unsupported(format!("language '{}': {}", config.language_spec(), stderr))
    } else {
        OcrError::Failed(stderr.to_string())
    }
}

fn candidate_paths(
    configured: Option<&Path>,
    path_var: Option<OsString>,
    extra_search_paths: &[PathBuf],
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(configured) = configured {
        candidates.push(configured.to_path_buf());
    }
    if let Some(path_var) = path_var {
        candidates.extend(std::env::split_paths(&path_var).map(|dir| dir.join(EXECUTABLE)));
    }
    candidates.extend(extra_search_paths.iter().map(|dir| {
        if dir.ends_with(EXECUTABLE) {
            dir.clone()
        } else {
            dir.join(EXECUTABLE)
        }
    }));
    candidates.extend(WELL_KNOWN_LOCATIONS.iter().map(PathBuf::from));

    candidates
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::PageSegMode;
    use image::{GrayImage, Luma};

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scanbrief-ocr-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn candidate_order_is_configured_path_env_extra_then_well_known() {
        let configured = PathBuf::from("/custom/tesseract");
        let path_var = std::env::join_paths(["/a", "/b"]).unwrap();
        let candidates = candidate_paths(
            Some(&configured),
            Some(path_var),
            &[PathBuf::from("/extra")],
        );

        assert_eq!(candidates[0], configured);
        assert_eq!(candidates[1], Path::new("/a").join(EXECUTABLE));
        assert_eq!(candidates[2], Path::new("/b").join(EXECUTABLE));
        assert_eq!(candidates[3], Path::new("/extra").join(EXECUTABLE));
        assert_eq!(candidates.len(), 4 + WELL_KNOWN_LOCATIONS.len());
    }

    #[test]
    fn first_existing_skips_missing_files() {
        let dir = scratch_dir();
        let present = dir.join(EXECUTABLE);
        std::fs::write(&present, b"").unwrap();

        let found = first_existing(&[dir.join("missing").join(EXECUTABLE), present.clone()]);
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(found, Some(present));
    }

    #[test]
    fn directories_are_not_executables() {
        let dir = scratch_dir();
        let found = first_existing(&[dir.clone()]);
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(found, None);
    }

    #[test]
    fn missing_command_is_reported_per_attempt() {
        let engine = TesseractCli::new(None);
        let image = RasterImage::from_gray(GrayImage::from_pixel(8, 8, Luma([255])));
        let config = ExtractionConfig::new(PageSegMode::UniformBlock, "eng");

        assert!(matches!(
            engine.recognize(&image, &config),
            Err(OcrError::EngineMissing(_))
        ));
        assert!(!engine.is_available());
    }

    #[test]
    fn nonexistent_command_is_unavailable() {
        let engine = TesseractCli::new(Some(PathBuf::from("/nonexistent/scanbrief/tesseract")));
        assert!(!engine.is_available());
        assert!(engine.version().is_err());
    }

    #[test]
    fn language_load_failures_are_unsupported() {
        let config = ExtractionConfig::new(PageSegMode::UniformBlock, "eng").with_language("equ");
        let error = classify_failure("Error opening data file equ.traineddata", &config);
        assert!(matches!(error, OcrError::Unsupported(_)));
        assert!(matches!(
            classify_failure("Segmentation fault", &config),
            OcrError::Failed(_)
        ));
    }
}
