//! Workspace layout and scaffolding.
//!
//! A workspace is a directory holding everything one generation job needs:
//!
//! ```text
//! <name>/
//!   workspace.toml
//!   data/        CSV input
//!   templates/   *.tpl sources
//!   output/      generated files
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;

pub const DATA_DIR: &str = "data";
pub const TEMPLATES_DIR: &str = "templates";
pub const OUTPUT_DIR: &str = "output";

const CONFIG_TEMPLATE: &str = r#"# CSV data file name, placed in the data directory of this workspace
#csv_data = "data.csv"

# field separator used in the CSV file
#csv_delimiter = ","

# what a template prints for a key that is neither a column nor a var
#   invalid - '<no value>' is printed in place of the key
#   zero    - nothing is printed
#   error   - the record fails
#missing_key = "invalid"

# remove previously generated files from output/ before generating
#override_output = false

# what a failing record does to the rest of the run: continue or abort
#on_error = "continue"

# extension of generated files
#output_extension = "txt"

# write every record into this single file in output/ instead
#single_file = "all.cfg"

# column holding the template name (without the .tpl extension)
template_column_name = "router"
# column holding the output file name (without extension)
output_column_name = "hostname"

[vars]
# variables available to every template
"#;

const README_FILES: &[(&str, &str)] = &[
    (
        "README.md",
        "## Workspace root\n\nThe workspace.toml configuration file lives here.\n",
    ),
    (
        "data/README.md",
        "## Data\n\nCSV input goes here. The first row names the columns.\n",
    ),
    (
        "templates/README.md",
        "## Templates\n\nTemplate sources (`*.tpl`) used by this workspace.\n",
    ),
    (
        "output/README.md",
        "## Output\n\nGenerated files are written here.\n",
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("directory {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid workspace name '{0}'")]
    InvalidName(String),

    #[error("failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Paths inside a workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Resolves a configuration path; relative paths are taken from the workspace root.
    pub fn config_path(&self, config: &Path) -> PathBuf {
        if config.is_absolute() {
            config.to_path_buf()
        } else {
            self.root.join(config)
        }
    }

    /// Creates a new workspace named `name` under `parent`.
    ///
    /// Fails if the directory already exists. On any later failure the
    /// partially created workspace is removed.
    pub fn create(parent: &Path, name: &str) -> Result<Self, WorkspaceError> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed.contains(['/', '\\'])
            || trimmed == "."
            || trimmed == ".."
        {
            return Err(WorkspaceError::InvalidName(name.to_string()));
        }

        let root = parent.join(trimmed);
        if root.exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        fs::create_dir_all(parent).map_err(|source| WorkspaceError::Create {
            path: parent.to_path_buf(),
            source,
        })?;
        fs::create_dir(&root).map_err(|source| WorkspaceError::Create {
            path: root.clone(),
            source,
        })?;

        let workspace = Self::new(root);
        if let Err(err) = workspace.populate() {
            if let Err(cleanup) = fs::remove_dir_all(&workspace.root) {
                log::warn!(
                    "failed to remove partial workspace {}: {}",
                    workspace.root.display(),
                    cleanup
                );
            }
            return Err(err);
        }

        log::info!("created workspace {}", workspace.root.display());
        Ok(workspace)
    }

    fn populate(&self) -> Result<(), WorkspaceError> {
        for dir in [DATA_DIR, TEMPLATES_DIR, OUTPUT_DIR] {
            let path = self.root.join(dir);
            fs::create_dir(&path).map_err(|source| WorkspaceError::Create { path, source })?;
        }

        let config = self.root.join(CONFIG_FILE_NAME);
        fs::write(&config, CONFIG_TEMPLATE).map_err(|source| WorkspaceError::Create {
            path: config,
            source,
        })?;

        for (file, content) in README_FILES {
            let path = self.root.join(file);
            fs::write(&path, content).map_err(|source| WorkspaceError::Create { path, source })?;
        }
        Ok(())
    }
}
