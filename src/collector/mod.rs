//! File collection for uploads
//!
//! Walks files and folders the user hands to `upload`, keeping only the
//! formats the extractor understands. `.gitignore` patterns are respected.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use ignore::WalkBuilder;

// ============================================================================
// File Types
// ============================================================================

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Plain text / markdown
    Text,
    Pdf,
    /// Word 2007+ document
    Docx,
    /// Scanned page or photo, OCR'd through Gemini
    Image,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "md" | "text" => Some(FileType::Text),
            "pdf" => Some(FileType::Pdf),
            "docx" => Some(FileType::Docx),
            "png" | "jpg" | "jpeg" | "webp" => Some(FileType::Image),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// MIME type sent with inline data; `None` for formats never sent to the LLM
    pub fn mime_type(&self, path: &Path) -> Option<&'static str> {
        match self {
            FileType::Pdf => Some("application/pdf"),
            FileType::Image => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_lowercase())
                    .unwrap_or_default();
                match ext.as_str() {
                    "png" => Some("image/png"),
                    "webp" => Some("image/webp"),
                    _ => Some("image/jpeg"),
                }
            }
            FileType::Text | FileType::Docx => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileType::Text => "text",
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Image => "image",
        }
    }
}

// ============================================================================
// Collected File
// ============================================================================

#[derive(Debug, Clone)]
pub struct CollectedFile {
    /// Absolute path
    pub path: PathBuf,
    pub file_type: FileType,
    /// Size in bytes
    pub size: u64,
    pub modified_at: Option<SystemTime>,
}

impl CollectedFile {
    /// `Ok(None)` for unsupported extensions and non-files
    pub fn from_path(path: PathBuf) -> Result<Option<Self>> {
        let Some(file_type) = FileType::from_path(&path) else {
            return Ok(None);
        };

        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?;

        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            path,
            file_type,
            size: metadata.len(),
            modified_at: metadata.modified().ok(),
        }))
    }

    /// Stable document key for the knowledge store
    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

// ============================================================================
// File Collector
// ============================================================================

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub respect_gitignore: bool,
    pub include_hidden: bool,
    /// Bytes; 0 disables the limit
    pub max_file_size: u64,
    pub skip_images: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            max_file_size: 25 * 1024 * 1024, // 25MB
            skip_images: false,
        }
    }
}

pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    fn absolute(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(std::env::current_dir()?.join(path))
        }
    }

    /// Collect one explicitly named file
    ///
    /// Unlike directory walks, an unsupported extension is an error here.
    pub fn collect_file(&self, path: &Path) -> Result<Option<CollectedFile>> {
        let abs_path = Self::absolute(path)?;

        if !abs_path.exists() {
            anyhow::bail!("File not found: {:?}", abs_path);
        }
        if !abs_path.is_file() {
            anyhow::bail!("Not a file: {:?}", abs_path);
        }

        let Some(file) = CollectedFile::from_path(abs_path.clone())? else {
            anyhow::bail!(
                "Unsupported file type: {:?} (expected pdf, docx, txt, md, png, jpg, webp)",
                abs_path
            );
        };

        if !self.should_include(&file) {
            return Ok(None);
        }
        Ok(Some(file))
    }

    /// Collect many paths; directories are walked, files are collected directly
    pub fn collect_paths(&self, paths: &[PathBuf]) -> Result<Vec<CollectedFile>> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(self.collect_directory(path)?);
            } else if let Some(file) = self.collect_file(path)? {
                files.push(file);
            }
        }
        Ok(files)
    }

    /// Recursive walk honouring `.gitignore`
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<CollectedFile>> {
        let abs_path = Self::absolute(path)?;

        if !abs_path.exists() {
            anyhow::bail!("Directory not found: {:?}", abs_path);
        }
        if !abs_path.is_dir() {
            anyhow::bail!("Not a directory: {:?}", abs_path);
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&abs_path)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .require_git(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match CollectedFile::from_path(entry.path().to_path_buf()) {
                Ok(Some(file)) if self.should_include(&file) => files.push(file),
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to collect file: {}", e),
            }
        }

        tracing::info!("Collected {} files from {:?}", files.len(), abs_path);
        Ok(files)
    }

    fn should_include(&self, file: &CollectedFile) -> bool {
        if self.config.max_file_size > 0 && file.size > self.config.max_file_size {
            tracing::warn!("Skipping large file: {:?} ({} bytes)", file.path, file.size);
            return false;
        }

        if self.config.skip_images && file.file_type == FileType::Image {
            return false;
        }

        true
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default)]
pub struct CollectionStats {
    pub total_files: usize,
    pub text_files: usize,
    pub pdf_files: usize,
    pub docx_files: usize,
    pub image_files: usize,
    pub total_size: u64,
}

impl CollectionStats {
    pub fn from_files(files: &[CollectedFile]) -> Self {
        let mut stats = Self::default();

        for file in files {
            stats.total_files += 1;
            stats.total_size += file.size;

            match file.file_type {
                FileType::Text => stats.text_files += 1,
                FileType::Pdf => stats.pdf_files += 1,
                FileType::Docx => stats.docx_files += 1,
                FileType::Image => stats.image_files += 1,
            }
        }

        stats
    }
}

// ============================================================================
// Tests
// ============================================================================
