//! egg-export.toml batch manifest
//!
//! Lists the animations of one glTF file to export, each to its own `.egg`
//! file named after its export name.
//!
//! ```toml
//! [source]
//! input = "hero.glb"
//! skin = "Armature"
//! bundle = "Hero"
//! fps = 24
//!
//! [output]
//! dir = "anims"
//!
//! [[animations]]
//! name = "Walk"
//! export_name = "hero-walk"
//!
//! [[animations]]
//! name = "Idle"
//! select = false
//! ```

use anyhow::{bail, Context, Result};
use egg_anim::{EggOptions, ExportSummary, FileSink};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::animation::{
    bundle_name, export_clip, frame_range, load_rig, ClipExport, DEFAULT_FRAME_RATE,
};
use crate::scene::GltfScene;

/// Extension of written animation files
pub const EGG_EXTENSION: &str = "egg";

/// egg-export.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct ExportManifest {
    pub source: SourceSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub animations: Vec<AnimationEntry>,
}

/// Input file section
#[derive(Debug, Deserialize)]
pub struct SourceSection {
    /// glTF/GLB path, relative to the manifest
    pub input: String,

    /// Skin to export. Default: first skin in the file
    #[serde(default)]
    pub skin: Option<String>,

    /// `<Bundle>` name. Default: skin name
    #[serde(default)]
    pub bundle: Option<String>,

    /// Sampling and playback rate. Default: 30
    #[serde(default = "default_fps")]
    pub fps: f32,

    /// Also export every animation in the file that is not listed
    #[serde(default)]
    pub all: bool,
}

fn default_fps() -> f32 {
    DEFAULT_FRAME_RATE
}

/// Output section
#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    /// Directory for .egg files, relative to the manifest. Default: manifest directory
    pub dir: Option<String>,

    /// Tool name written into the header comment
    pub tool_name: Option<String>,
}

/// Single animation entry
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationEntry {
    /// Animation name in the source file
    pub name: String,

    /// Output file stem. Default: `name`
    #[serde(default)]
    pub export_name: Option<String>,

    /// Whether to export this entry. Default: true
    #[serde(default = "default_select")]
    pub select: bool,

    /// First frame (inclusive). Default: 0
    #[serde(default)]
    pub frame_from: Option<i32>,

    /// Last frame (inclusive). Default: end of clip
    #[serde(default)]
    pub frame_to: Option<i32>,
}

fn default_select() -> bool {
    true
}

impl AnimationEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            export_name: None,
            select: true,
            frame_from: None,
            frame_to: None,
        }
    }

    pub fn export_name(&self) -> &str {
        self.export_name.as_deref().unwrap_or(&self.name)
    }
}

/// Exported batch item
#[derive(Debug)]
pub struct ExportedItem {
    pub name: String,
    pub path: PathBuf,
    pub summary: ExportSummary,
}

/// Batch item that failed; the rest of the batch still ran
#[derive(Debug)]
pub struct FailedItem {
    pub name: String,
    pub error: anyhow::Error,
}

/// Outcome of [`build_all`]
#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<ExportedItem>,
    pub failed: Vec<FailedItem>,
    /// Entries with `select = false`
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl ExportManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse egg-export.toml")
    }

    /// Check batch-wide settings that do not need the source file
    ///
    /// Per-entry frame ranges are not checked here; see
    /// [`ExportManifest::inverted_ranges`].
    pub fn validate(&self) -> Result<()> {
        if !self.source.fps.is_finite() || self.source.fps <= 0.0 {
            bail!("fps must be positive, got {}", self.source.fps);
        }

        let mut export_names = HashSet::new();
        for entry in &self.animations {
            let export_name = entry.export_name();
            if export_name.is_empty()
                || export_name.contains(['/', '\\'])
                || export_name == "."
                || export_name == ".."
            {
                bail!(
                    "Animation '{}': export name '{}' must be a plain file name",
                    entry.name,
                    export_name
                );
            }
            if entry.select && !export_names.insert(export_name) {
                bail!("Duplicate export name '{}'", export_name);
            }
        }

        if self.animations.is_empty() && !self.source.all {
            bail!("No animations listed and [source] all is not set");
        }

        Ok(())
    }

    /// Selected entries whose explicit `frame_to` precedes `frame_from`
    ///
    /// [`build_all`] reports these per item; [`check`] rejects them.
    pub fn inverted_ranges(&self) -> Vec<&AnimationEntry> {
        self.animations
            .iter()
            .filter(|entry| entry.select)
            .filter(|entry| {
                matches!(
                    (entry.frame_from, entry.frame_to),
                    (Some(from), Some(to)) if to < from
                )
            })
            .collect()
    }

    /// Listed entries, plus every other animation of `scene` when `all` is set
    pub fn entries(&self, scene: &GltfScene) -> Vec<AnimationEntry> {
        let mut entries = self.animations.clone();
        if self.source.all {
            let listed: HashSet<String> = entries.iter().map(|e| e.name.clone()).collect();
            for info in scene.animations() {
                if !listed.contains(&info.name) {
                    entries.push(AnimationEntry::new(&info.name));
                }
            }
        }
        entries
    }

    fn input_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.source.input)
    }

    fn output_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.output.dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        }
    }
}

/// Load, validate and check that every selected source animation exists
pub fn check(manifest_path: &Path) -> Result<ExportManifest> {
    let manifest = ExportManifest::load(manifest_path)?;
    manifest.validate()?;
    if let Some(entry) = manifest.inverted_ranges().first() {
        bail!(
            "Animation '{}': frame_to {} precedes frame_from {}",
            entry.name,
            entry.frame_to.unwrap_or_default(),
            entry.frame_from.unwrap_or_default()
        );
    }

    let base_dir = manifest_dir(manifest_path);
    let (scene, rig) = load_rig(
        &manifest.input_path(&base_dir),
        manifest.source.skin.as_deref(),
    )?;

    let missing: Vec<String> = manifest
        .entries(&scene)
        .into_iter()
        .filter(|entry| entry.select && scene.find_animation(&entry.name).is_none())
        .map(|entry| entry.name)
        .collect();
    if !missing.is_empty() {
        let available: Vec<String> = scene.animations().into_iter().map(|a| a.name).collect();
        bail!(
            "Animations not found: {:?}. Available animations: {:?}",
            missing,
            available
        );
    }

    tracing::info!(
        "Skin '{}': {} bones, {} animations to export",
        rig.name,
        rig.bone_count(),
        manifest
            .entries(&scene)
            .iter()
            .filter(|e| e.select)
            .count()
    );
    Ok(manifest)
}

/// Export every selected animation
///
/// A missing animation, an inverted frame range or a failed write is recorded
/// in the report and does not stop the remaining items. Failure to load the
/// source file or an invalid batch setting fails the whole batch.
pub fn build_all(
    manifest: &ExportManifest,
    manifest_path: &Path,
    output_override: Option<&Path>,
) -> Result<BatchReport> {
    manifest.validate()?;

    let base_dir = manifest_dir(manifest_path);
    let (scene, rig) = load_rig(
        &manifest.input_path(&base_dir),
        manifest.source.skin.as_deref(),
    )?;

    let output_dir = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest.output_dir(&base_dir));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut options = EggOptions::new(bundle_name(manifest.source.bundle.as_deref(), &rig));
    if let Some(tool_name) = &manifest.output.tool_name {
        options = options.with_tool_name(tool_name.as_str());
    }

    let mut report = BatchReport::default();
    for entry in manifest.entries(&scene) {
        if !entry.select {
            report.skipped += 1;
            continue;
        }

        let path = output_dir.join(format!("{}.{}", entry.export_name(), EGG_EXTENSION));
        tracing::info!("Export animation \"{}\" to file {:?}", entry.name, path);

        let clip = ClipExport {
            animation_name: &entry.name,
            fps: manifest.source.fps,
            frame_range: frame_range(
                &scene,
                &entry.name,
                manifest.source.fps,
                entry.frame_from,
                entry.frame_to,
            ),
            options: options.clone(),
        };

        match export_clip(&scene, &rig, &clip, &mut FileSink::new(&path)) {
            Ok(summary) => report.exported.push(ExportedItem {
                name: entry.name.clone(),
                path,
                summary,
            }),
            Err(err) => {
                tracing::warn!("Export of \"{}\" failed: {}", entry.name, err);
                report.failed.push(FailedItem {
                    name: entry.name.clone(),
                    error: err.into(),
                });
            }
        }
    }

    Ok(report)
}

fn manifest_dir(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = ExportManifest::parse(
            r#"
            [source]
            input = "hero.glb"
            skin = "Armature"
            bundle = "Hero"
            fps = 24

            [output]
            dir = "anims"

            [[animations]]
            name = "Walk"
            export_name = "hero-walk"
            frame_from = 1
            frame_to = 24

            [[animations]]
            name = "Idle"
            select = false
            "#,
        )
        .unwrap();

        assert_eq!(manifest.source.input, "hero.glb");
        assert_eq!(manifest.source.skin.as_deref(), Some("Armature"));
        assert_eq!(manifest.source.fps, 24.0);
        assert_eq!(manifest.output.dir.as_deref(), Some("anims"));
        assert_eq!(manifest.animations.len(), 2);
        assert_eq!(manifest.animations[0].export_name(), "hero-walk");
        assert_eq!(manifest.animations[0].frame_to, Some(24));
        assert!(!manifest.animations[1].select);
        assert_eq!(manifest.animations[1].export_name(), "Idle");
        manifest.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let manifest = ExportManifest::parse(
            r#"
            [source]
            input = "a.gltf"
            all = true
            "#,
        )
        .unwrap();
        assert_eq!(manifest.source.fps, DEFAULT_FRAME_RATE);
        assert!(manifest.source.bundle.is_none());
        assert!(manifest.output.dir.is_none());
        assert!(manifest.animations.is_empty());
        manifest.validate().unwrap();
    }

    #[test]
    fn test_output_dir_relative_to_manifest() {
        let manifest = ExportManifest::parse(
            "[source]\ninput = \"a.glb\"\n[output]\ndir = \"out\"\n[[animations]]\nname = \"A\"\n",
        )
        .unwrap();
        let base = Path::new("project");
        assert_eq!(manifest.input_path(base), Path::new("project/a.glb"));
        assert_eq!(manifest.output_dir(base), Path::new("project/out"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let manifest = ExportManifest::parse(
            r#"
            [source]
            input = "a.glb"
            [[animations]]
            name = "Walk"
            export_name = "move"
            [[animations]]
            name = "Run"
            export_name = "move"
            "#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate export name"));
    }

    #[test]
    fn test_validate_allows_duplicate_when_deselected() {
        let manifest = ExportManifest::parse(
            r#"
            [source]
            input = "a.glb"
            [[animations]]
            name = "Walk"
            export_name = "move"
            [[animations]]
            name = "Run"
            export_name = "move"
            select = false
            "#,
        )
        .unwrap();
        manifest.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_path_export_names() {
        for bad in ["../escape", "dir/name", "..", ""] {
            let content = format!(
                "[source]\ninput = \"a.glb\"\n[[animations]]\nname = \"Walk\"\nexport_name = \"{}\"\n",
                bad
            );
            let manifest = ExportManifest::parse(&content).unwrap();
            assert!(manifest.validate().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_inverted_range_left_to_the_item() {
        let manifest = ExportManifest::parse(
            r#"
            [source]
            input = "a.glb"
            [[animations]]
            name = "Walk"
            frame_from = 10
            frame_to = 2
            [[animations]]
            name = "Run"
            frame_from = 50
            [[animations]]
            name = "Idle"
            frame_from = 9
            frame_to = 1
            select = false
            "#,
        )
        .unwrap();
        manifest.validate().unwrap();

        let inverted: Vec<&str> = manifest
            .inverted_ranges()
            .into_iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(inverted, ["Walk"]);
    }

    #[test]
    fn test_validate_rejects_bad_fps_and_empty_list() {
        let manifest =
            ExportManifest::parse("[source]\ninput = \"a.glb\"\nfps = 0\n[[animations]]\nname = \"A\"\n")
                .unwrap();
        assert!(manifest.validate().is_err());

        let manifest = ExportManifest::parse("[source]\ninput = \"a.glb\"\n").unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_missing_source_section_fails() {
        assert!(ExportManifest::parse("[[animations]]\nname = \"A\"\n").is_err());
    }
}
