//! Surfaces backed by files in an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use vitals_core::VitalsError;
use vitals_ui::Surface;

/// Writes each surface to `<root>/<id>.svg` when the markup is a chart and
/// `<root>/<id>.html` otherwise. Only one of the two files exists at a time.
#[derive(Debug, Clone)]
pub struct DirectorySurface {
    root: PathBuf,
}

impl DirectorySurface {
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, VitalsError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| VitalsError::Surface {
            id: root.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File currently holding `surface_id`, if it has been written.
    pub fn path_of(&self, surface_id: &str) -> Option<PathBuf> {
        ["svg", "html"]
            .into_iter()
            .map(|ext| self.root.join(format!("{surface_id}.{ext}")))
            .find(|path| path.exists())
    }
}

impl Surface for DirectorySurface {
    fn replace_contents(&mut self, surface_id: &str, markup: &str) -> Result<(), VitalsError> {
        let valid = !surface_id.is_empty()
            && surface_id
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(VitalsError::Surface {
                id: surface_id.to_string(),
                message: "surface ids may only contain letters, digits, '-' and '_'".to_string(),
            });
        }

        let (ext, stale) = if markup.starts_with("<svg") {
            ("svg", "html")
        } else {
            ("html", "svg")
        };
        let target = self.root.join(format!("{surface_id}.{ext}"));
        let staging = self.root.join(format!(".{surface_id}.{ext}.tmp"));
        let io_error = |err: std::io::Error| VitalsError::Surface {
            id: surface_id.to_string(),
            message: err.to_string(),
        };

        fs::write(&staging, markup).map_err(io_error)?;
        fs::rename(&staging, &target).map_err(io_error)?;

        let stale = self.root.join(format!("{surface_id}.{stale}"));
        if stale.exists() {
            fs::remove_file(&stale).map_err(io_error)?;
        }
        tracing::trace!(surface = surface_id, path = %target.display(), "surface written");
        Ok(())
    }
}
