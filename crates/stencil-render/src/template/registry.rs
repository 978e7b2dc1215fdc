//! Template source lookup.
//!
//! [`TemplateRegistry`] maps a logical template name (usually a column value
//! such as `"edge-router"`) to its source text. It only locates and reads
//! sources; compiling and caching is [`TemplateCache`](super::TemplateCache)'s
//! job.
//!
//! # Resolution
//!
//! 1. Inline templates added with [`TemplateRegistry::add_inline`] (highest priority)
//! 2. Template directories, in registration order (first directory wins)
//!
//! Names are mapped to file names by appending [`TEMPLATE_EXTENSION`] unless
//! the name already carries it, so `"edge"` and `"edge.tpl"` are the same
//! template.
//!
//! Names come from data, so they must stay inside the template directories:
//! absolute names and `..` components are rejected as not found.
//!
//! # Example
//!
//! ```rust
//! use stencil_render::TemplateRegistry;
//!
//! let mut registry = TemplateRegistry::new();
//! registry.add_inline("edge", "hostname {{ hostname }}");
//!
//! assert_eq!(registry.get_content("edge.tpl").unwrap(), "hostname {{ hostname }}");
//! ```

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::Error;
use crate::text::decode_utf8;

/// Extension appended to template names that lack it.
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// Returns the file name a template name maps to (`"edge"` → `"edge.tpl"`).
pub fn template_file_name(name: &str) -> String {
    let suffix = format!(".{}", TEMPLATE_EXTENSION);
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Where a template's source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTemplate {
    /// Source stored in memory.
    Inline(String),

    /// Source read from disk on demand.
    File(PathBuf),
}

/// Error type for template registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No inline template or file matches the name.
    #[error("Template not found: \"{name}\"")]
    NotFound { name: String },

    /// A registered directory does not exist or is not a directory.
    #[error("Template directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// Reading the template file failed.
    #[error("Failed to read template \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { name } => Error::NotFound { name },
            RegistryError::DirectoryNotFound { .. } => Error::Config(err.to_string()),
            RegistryError::Read { path, source } => Error::Io { path, source },
        }
    }
}

/// Registry for template lookup from inline sources and directories.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    /// Inline templates keyed by file name (with extension).
    inline: HashMap<String, String>,

    /// Template directories in search order.
    dirs: Vec<PathBuf>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry searching a single directory.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.add_template_dir(path)?;
        Ok(registry)
    }

    /// Adds an inline template. Inline templates shadow files of the same name.
    pub fn add_inline(&mut self, name: impl AsRef<str>, content: impl Into<String>) {
        self.inline
            .insert(template_file_name(name.as_ref()), content.into());
    }

    /// Adds a directory to search for `*.tpl` files.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DirectoryNotFound`] if the path is not a directory.
    pub fn add_template_dir(&mut self, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(RegistryError::DirectoryNotFound {
                path: path.to_path_buf(),
            });
        }
        self.dirs.push(path.to_path_buf());
        Ok(())
    }

    /// Looks up a template by name.
    pub fn get(&self, name: &str) -> Result<ResolvedTemplate, RegistryError> {
        let file_name = template_file_name(name);

        if let Some(content) = self.inline.get(&file_name) {
            return Ok(ResolvedTemplate::Inline(content.clone()));
        }

        if is_contained(Path::new(&file_name)) {
            for dir in &self.dirs {
                let path = dir.join(&file_name);
                if path.is_file() {
                    return Ok(ResolvedTemplate::File(path));
                }
            }
        }

        Err(RegistryError::NotFound {
            name: name.to_string(),
        })
    }

    /// Returns a template's source text, reading it from disk if necessary.
    ///
    /// File sources must be UTF-8; a leading byte-order marker is dropped.
    pub fn get_content(&self, name: &str) -> Result<String, Error> {
        match self.get(name)? {
            ResolvedTemplate::Inline(content) => Ok(content),
            ResolvedTemplate::File(path) => {
                let bytes = std::fs::read(&path).map_err(|source| RegistryError::Read {
                    path: path.clone(),
                    source,
                })?;
                let text = decode_utf8(&bytes, &format!("template '{}'", path.display()))?;
                Ok(text.to_string())
            }
        }
    }

    /// Registered template directories, in search order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Number of inline templates.
    pub fn inline_len(&self) -> usize {
        self.inline.len()
    }
}

/// True if `path` is relative and never climbs out of its root.
pub(crate) fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_template_file_name() {
        assert_eq!(template_file_name("edge"), "edge.tpl");
        assert_eq!(template_file_name("edge.tpl"), "edge.tpl");
        assert_eq!(template_file_name("core/edge"), "core/edge.tpl");
        assert_eq!(template_file_name("edge.txt"), "edge.txt.tpl");
    }

    #[test]
    fn test_registry_add_inline() {
        let mut registry = TemplateRegistry::new();
        registry.add_inline("header", "{{ title }}");

        assert_eq!(registry.inline_len(), 1);
        assert_eq!(registry.get_content("header").unwrap(), "{{ title }}");
        assert_eq!(registry.get_content("header.tpl").unwrap(), "{{ title }}");
    }

    #[test]
    fn test_registry_inline_overwrites() {
        let mut registry = TemplateRegistry::new();
        registry.add_inline("header", "first");
        registry.add_inline("header.tpl", "second");

        assert_eq!(registry.get_content("header").unwrap(), "second");
    }

    #[test]
    fn test_registry_not_found() {
        let registry = TemplateRegistry::new();
        assert!(matches!(
            registry.get("nonexistent"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            registry.get_content("nonexistent"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_registry_reads_files_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("edge.tpl"), "interface {{ port }}\n").unwrap();

        let registry = TemplateRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(
            registry.get("edge").unwrap(),
            ResolvedTemplate::File(dir.path().join("edge.tpl"))
        );
        assert_eq!(registry.get_content("edge").unwrap(), "interface {{ port }}\n");
    }

    #[test]
    fn test_registry_inline_shadows_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("edge.tpl"), "from file").unwrap();

        let mut registry = TemplateRegistry::from_dir(dir.path()).unwrap();
        registry.add_inline("edge", "inline");
        assert_eq!(registry.get_content("edge").unwrap(), "inline");
    }

    #[test]
    fn test_registry_first_dir_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("a.tpl"), "first").unwrap();
        fs::write(second.path().join("a.tpl"), "second").unwrap();
        fs::write(second.path().join("b.tpl"), "only second").unwrap();

        let mut registry = TemplateRegistry::from_dir(first.path()).unwrap();
        registry.add_template_dir(second.path()).unwrap();

        assert_eq!(registry.get_content("a").unwrap(), "first");
        assert_eq!(registry.get_content("b").unwrap(), "only second");
    }

    #[test]
    fn test_registry_rejects_escaping_names() {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("templates");
        fs::create_dir(&templates).unwrap();
        fs::write(root.path().join("secret.tpl"), "x").unwrap();

        let registry = TemplateRegistry::from_dir(&templates).unwrap();
        assert!(registry.get("../secret").is_err());
    }

    #[test]
    fn test_registry_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = TemplateRegistry::from_dir(dir.path().join("missing"));
        assert!(matches!(result, Err(RegistryError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_registry_rejects_non_utf8_file_and_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.tpl"), [0xffu8, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("bom.tpl"), b"\xef\xbb\xbfhello").unwrap();

        let registry = TemplateRegistry::from_dir(dir.path()).unwrap();
        assert!(matches!(
            registry.get_content("bad"),
            Err(Error::Encoding { .. })
        ));
        assert_eq!(registry.get_content("bom").unwrap(), "hello");
    }
}
