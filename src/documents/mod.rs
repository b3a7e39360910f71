
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{QaError, Result};

/// A raw source document loaded from disk or an upload batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier: path relative to the documents directory
    pub path: String,
    /// Raw UTF-8 text content
    pub content: String,
}

const SUPPORTED_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Load all `.txt` and `.md` documents under a directory, recursively.
///
/// Results are sorted by path so repeated loads of the same tree are
/// deterministic. Files that are not valid UTF-8 are skipped with a warning.
#[inline]
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.exists() {
        return Err(QaError::Storage(format!(
            "documents path does not exist: {}",
            dir.display()
        )));
    }

    info!("Loading documents from: {}", dir.display());

    let mut documents = Vec::new();
    collect_documents(dir, dir, &mut documents)?;
    documents.sort_by(|a, b| a.path.cmp(&b.path));

    info!("Loaded {} documents", documents.len());
    Ok(documents)
}

fn collect_documents(root: &Path, dir: &Path, documents: &mut Vec<Document>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_documents(root, &path, documents)?;
        } else if is_supported(&path) {
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let identifier = relative_identifier(root, &path);
                    debug!("Loaded document: {} ({} bytes)", identifier, content.len());
                    documents.push(Document {
                        path: identifier,
                        content,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable document {}: {}", path.display(), e);
                }
            }
        }
    }
    Ok(())
}

/// Copy an upload batch into the documents directory, returning the staged
/// file names. Rejects anything that is not a `.txt` or `.md` file.
#[inline]
pub fn stage_uploads(documents_dir: &Path, files: &[PathBuf]) -> Result<Vec<String>> {
    for file in files {
        if !is_supported(file) {
            return Err(QaError::Config(format!(
                "invalid file type: {} (only .txt and .md files are allowed)",
                file.display()
            )));
        }
    }

    fs::create_dir_all(documents_dir)?;

    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .ok_or_else(|| QaError::Config(format!("invalid file path: {}", file.display())))?;
        let target = documents_dir.join(name);
        fs::copy(file, &target)?;
        info!("Staged upload: {}", target.display());
        staged.push(name.to_string_lossy().into_owned());
    }

    Ok(staged)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

fn relative_identifier(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
