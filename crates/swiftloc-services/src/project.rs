//! Project layout discovery.
//!
//! The layout is resolved once per run from the scan root plus optional
//! overrides (flags or config), then passed read-only to every stage.

use std::path::{Path, PathBuf};

use swiftloc_core::TargetGroup;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("no .xcodeproj directory found under {0}")]
    XcodeprojNotFound(String),
    #[error("project manifest not found: {0}")]
    ManifestMissing(String),
    #[error("{group} source directory not found: {path}")]
    GroupDirMissing { group: TargetGroup, path: String },
    #[error("widget target requested but no widget directory is configured or present")]
    WidgetNotConfigured,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Optional layout overrides; unset fields fall back to discovery.
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub app_dir: Option<String>,
    pub widget_dir: Option<String>,
    pub xcodeproj: Option<String>,
    pub info_plists: Option<Vec<String>>,
}

/// Resolved on-disk layout of an Xcode project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub pbx_path: PathBuf,
    pub app_dir: PathBuf,
    pub widget_dir: Option<PathBuf>,
    pub info_plists: Vec<PathBuf>,
}

fn find_xcodeproj(root: &Path) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.extension().is_some_and(|ext| ext == "xcodeproj"))
        .collect();
    found.sort();
    found.into_iter().next()
}

impl ProjectLayout {
    /// Resolve the layout under `root`. The app directory defaults to the
    /// xcodeproj stem, the widget directory to `<stem>Widget` when that
    /// directory exists, and the plist list to each group's `Info.plist`.
    pub fn discover(root: &Path, overrides: &ProjectOverrides) -> Result<Self, ProjectError> {
        let xcodeproj = match &overrides.xcodeproj {
            Some(name) => root.join(name),
            None => find_xcodeproj(root)
                .ok_or_else(|| ProjectError::XcodeprojNotFound(root.display().to_string()))?,
        };
        let pbx_path = xcodeproj.join("project.pbxproj");
        if !pbx_path.is_file() {
            return Err(ProjectError::ManifestMissing(pbx_path.display().to_string()));
        }

        let stem = xcodeproj
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let app_dir = root.join(overrides.app_dir.as_deref().unwrap_or(&stem));
        if !app_dir.is_dir() {
            return Err(ProjectError::GroupDirMissing {
                group: TargetGroup::App,
                path: app_dir.display().to_string(),
            });
        }

        let widget_dir = match &overrides.widget_dir {
            Some(dir) => {
                let path = root.join(dir);
                if !path.is_dir() {
                    return Err(ProjectError::GroupDirMissing {
                        group: TargetGroup::Widget,
                        path: path.display().to_string(),
                    });
                }
                Some(path)
            }
            None => {
                let default = root.join(format!("{stem}Widget"));
                default.is_dir().then_some(default)
            }
        };

        let info_plists: Vec<PathBuf> = match &overrides.info_plists {
            Some(paths) => paths.iter().map(|p| root.join(p)).collect(),
            None => [Some(&app_dir), widget_dir.as_ref()]
                .into_iter()
                .flatten()
                .map(|dir| dir.join("Info.plist"))
                .filter(|p| p.is_file())
                .collect(),
        };

        Ok(Self {
            root: root.to_path_buf(),
            pbx_path,
            app_dir,
            widget_dir,
            info_plists,
        })
    }

    pub fn group_dir(&self, group: TargetGroup) -> Option<&Path> {
        match group {
            TargetGroup::App => Some(&self.app_dir),
            TargetGroup::Widget => self.widget_dir.as_deref(),
        }
    }

    /// String catalog for a group: `<group dir>/Localizable.xcstrings`.
    pub fn catalog_path(&self, group: TargetGroup) -> Option<PathBuf> {
        self.group_dir(group).map(|dir| dir.join("Localizable.xcstrings"))
    }

    /// Per-language run artifacts live under `localization/<language>/`.
    pub fn artifact_dir(&self, language: &str) -> PathBuf {
        self.root.join("localization").join(language)
    }

    pub fn permission_strings_path(&self, language: &str) -> PathBuf {
        self.app_dir
            .join(format!("{language}.lproj"))
            .join("InfoPlist.strings")
    }

    /// Root-relative display path with forward slashes.
    pub fn rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}
