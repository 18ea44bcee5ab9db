//! Walks a Unity project: dumps every scene, harvests script usage and
//! compares it against the project's script `.meta` files.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::{Walk, WalkBuilder};
use serde::Serialize;

use crate::config::{Config, Excludes};
use crate::error::{Result, SceneError};
use crate::harvest::{harvest, ScriptUsage};
use crate::hierarchy::dump_scene;
use crate::report::{read_meta_guid, render_csv, report, MetadataPair};
use crate::store::RecordStore;

pub const DUMP_SUFFIX: &str = ".dump";
pub const REPORT_FILE: &str = "UnusedScripts.csv";
const META_SUFFIX: &str = ".meta";

/// A scene or meta file that was skipped because its content is broken.
#[derive(Serialize, Debug, Clone)]
pub struct Failure {
    pub path: String,
    pub error: String,
}

/// What one successfully processed scene contributed to the run.
#[derive(Serialize, Debug, Clone, Default)]
pub struct SceneOutcome {
    pub path: String,
    pub records: usize,
    /// Hierarchy lines written; zero when no dump was requested
    pub lines: usize,
    pub new_scripts: usize,
}

#[derive(Serialize, Debug, Default)]
pub struct RunSummary {
    pub scenes_found: usize,
    pub scenes_dumped: usize,
    pub scenes: Vec<SceneOutcome>,
    pub failures: Vec<Failure>,
    pub scripts_used: usize,
    pub scripts_scanned: usize,
    pub unused: Vec<MetadataPair>,
}

impl RunSummary {
    pub fn records_read(&self) -> usize {
        self.scenes.iter().map(|scene| scene.records).sum()
    }

    pub fn lines_written(&self) -> usize {
        self.scenes.iter().map(|scene| scene.lines).sum()
    }
}

/// Result of processing every scene of a project.
#[derive(Debug, Default)]
pub struct ScenePass {
    pub found: usize,
    pub processed: Vec<SceneOutcome>,
    pub failures: Vec<Failure>,
}

pub struct Project {
    root: PathBuf,
    config: Config,
    excludes: Excludes,
}

impl Project {
    pub fn open(root: &Path, config: Config) -> Result<Project> {
        if !root.is_dir() {
            return Err(SceneError::InvalidProject(root.to_path_buf()));
        }
        let excludes = config.excludes().map_err(|source| SceneError::Config {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Project {
            root: root.to_path_buf(),
            config,
            excludes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk of the root, sorted by name at every level. Excluded directories
    /// are pruned.
    fn walk(&self) -> Walk {
        let root = self.root.clone();
        let excludes = self.excludes.clone();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(self.config.respect_ignore_files)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().map_or(false, |t| t.is_dir()) {
                    return true;
                }
                let path = entry.path();
                !excludes.dir(path.strip_prefix(&root).unwrap_or(path))
            });
        builder.build()
    }

    /// Files under the root accepted by `keep`.
    fn files(&self, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in self.walk() {
            let entry = entry.map_err(|e| {
                SceneError::io(&self.root, io::Error::new(io::ErrorKind::Other, e.to_string()))
            })?;
            if !entry.file_type().map_or(false, |t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if self.excludes.file(path.strip_prefix(&self.root).unwrap_or(path)) {
                continue;
            }
            if keep(path) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    pub fn scenes(&self) -> Result<Vec<PathBuf>> {
        self.files(|path| self.config.is_scene(path))
    }

    pub fn script_metas(&self) -> Result<Vec<PathBuf>> {
        self.files(|path| self.config.is_script_meta(path))
    }

    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    /// Load one scene, dump its hierarchy into `output` (when given) and
    /// harvest its script GUIDs. Scripts are harvested even when the
    /// hierarchy cannot be dumped.
    pub fn process_scene(
        &self,
        path: &Path,
        output: Option<&Path>,
        usage: &mut ScriptUsage,
    ) -> Result<SceneOutcome> {
        let text = fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        let scene = RecordStore::load(&text)?;

        let dumped = output.map(|_| dump_scene(&scene, &self.config.indent));
        let new_scripts = harvest(&scene.store, usage);

        let mut outcome = SceneOutcome {
            path: self.relative(path),
            records: scene.store.len(),
            lines: 0,
            new_scripts,
        };

        if let (Some(dir), Some(dumped)) = (output, dumped) {
            let dump = dumped?;
            outcome.lines = dump.lines().filter(|line| !line.is_empty()).count();
            let target = dir.join(dump_file_name(path));
            fs::write(&target, dump).map_err(|e| SceneError::io(&target, e))?;
        }

        tracing::debug!(
            scene = %path.display(),
            records = outcome.records,
            lines = outcome.lines,
            new_scripts = outcome.new_scripts,
            "scene processed"
        );
        Ok(outcome)
    }

    /// Process every scene. Broken scenes are collected as failures unless
    /// `fail_fast` is set; environment errors always stop the walk.
    pub fn process_scenes(
        &self,
        output: Option<&Path>,
        usage: &mut ScriptUsage,
        mut on_scene: impl FnMut(&Path),
    ) -> Result<ScenePass> {
        let scenes = self.scenes()?;
        let mut pass = ScenePass {
            found: scenes.len(),
            ..ScenePass::default()
        };
        let mut written: HashSet<String> = HashSet::new();

        for path in &scenes {
            on_scene(path);
            if output.is_some() && !written.insert(dump_file_name(path)) {
                tracing::warn!(scene = %path.display(), "another scene with the same file name was already dumped; overwriting");
            }
            match self.process_scene(path, output, usage) {
                Ok(outcome) => pass.processed.push(outcome),
                Err(e) if e.is_isolated() && !self.config.fail_fast => {
                    tracing::warn!(scene = %path.display(), error = %e, "skipping scene");
                    pass.failures.push(Failure {
                        path: self.relative(path),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(pass)
    }

    /// `(path, guid)` for every script `.meta` file, in walk order.
    pub fn metadata_pairs(&self) -> Result<(Vec<MetadataPair>, Vec<Failure>)> {
        let mut pairs = Vec::new();
        let mut failures = Vec::new();

        for path in self.script_metas()? {
            let text = fs::read_to_string(&path).map_err(|e| SceneError::io(&path, e))?;
            let relative = self.relative(&path);
            match read_meta_guid(&text) {
                Ok(guid) => {
                    let asset = relative
                        .strip_suffix(META_SUFFIX)
                        .unwrap_or(&relative)
                        .to_string();
                    pairs.push(MetadataPair::new(asset, guid));
                }
                Err(source) => {
                    let err = SceneError::MalformedMetadata {
                        path: path.clone(),
                        source,
                    };
                    if self.config.fail_fast {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, "skipping meta file");
                    failures.push(Failure {
                        path: relative,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok((pairs, failures))
    }

    /// Harvest every scene, then report the scripts none of them use.
    pub fn unused_scripts(
        &self,
        on_scene: impl FnMut(&Path),
    ) -> Result<(Vec<MetadataPair>, Vec<Failure>)> {
        let mut usage = ScriptUsage::new();
        let mut failures = self.process_scenes(None, &mut usage, on_scene)?.failures;
        let (pairs, meta_failures) = self.metadata_pairs()?;
        failures.extend(meta_failures);
        Ok((report(&usage, &pairs), failures))
    }

    /// Full run: hierarchy dumps plus `UnusedScripts.csv` under `output`.
    pub fn run(&self, output: &Path, on_scene: impl FnMut(&Path)) -> Result<RunSummary> {
        fs::create_dir_all(output).map_err(|e| SceneError::io(output, e))?;

        let mut usage = ScriptUsage::new();
        let pass = self.process_scenes(Some(output), &mut usage, on_scene)?;
        let mut failures = pass.failures;

        // Every scene has been harvested at this point
        let (pairs, meta_failures) = self.metadata_pairs()?;
        failures.extend(meta_failures);
        let unused = report(&usage, &pairs);

        let target = output.join(REPORT_FILE);
        fs::write(&target, render_csv(&unused)).map_err(|e| SceneError::io(&target, e))?;

        Ok(RunSummary {
            scenes_found: pass.found,
            scenes_dumped: pass.processed.len(),
            scenes: pass.processed,
            failures,
            scripts_used: usage.len(),
            scripts_scanned: pairs.len(),
            unused,
        })
    }
}

/// `Main.unity` -> `Main.unity.dump`
pub fn dump_file_name(scene: &Path) -> String {
    let name = scene
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}{}", name, DUMP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, document, game_object, mono_behaviour, transform};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn meta(guid: &str) -> String {
        format!("fileFormatVersion: 2\nguid: {}\nMonoImporter:\n  serializedVersion: 2\n", guid)
    }

    /// Two scenes, three scripts of which one is unused.
    fn sample_project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let t1 = transform("2", &[]);
        let level = document(
            &[
                ("1", 4, t1.as_str()),
                ("2", 1, game_object("Player").as_str()),
                ("3", 114, mono_behaviour("2", "aaaa0001").as_str()),
            ],
            Some(&["1"]),
        );
        write(root, "Assets/Scenes/Level.unity", &level);
        write(root, "Assets/Scenes/Menu.unity", fixtures::SIMPLE_SCENE);

        let hud = document(&[("7", 114, mono_behaviour("0", "bbbb0002").as_str())], Some(&[]));
        write(root, "Assets/Scenes/Sub/Hud.unity", &hud);

        write(root, "Assets/Scripts/Player.cs", "class Player {}");
        write(root, "Assets/Scripts/Player.cs.meta", &meta("aaaa0001"));
        write(root, "Assets/Scripts/Hud.cs.meta", &meta("bbbb0002"));
        write(root, "Assets/Scripts/Legacy.cs.meta", &meta("cccc0003"));
        write(root, "Assets/Scenes/Level.unity.meta", &meta("dddd0004"));
        dir
    }

    #[test]
    fn test_open_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            Project::open(&missing, Config::default()),
            Err(SceneError::InvalidProject(_))
        ));
    }

    #[test]
    fn test_scene_discovery_is_sorted() {
        let dir = sample_project();
        let project = Project::open(dir.path(), Config::default()).unwrap();
        let scenes: Vec<String> = project
            .scenes()
            .unwrap()
            .iter()
            .map(|p| project.relative(p))
            .collect();
        assert_eq!(
            scenes,
            vec![
                "Assets/Scenes/Level.unity",
                "Assets/Scenes/Menu.unity",
                "Assets/Scenes/Sub/Hud.unity"
            ]
        );
    }

    #[test]
    fn test_full_run() {
        let dir = sample_project();
        let out = dir.path().join("out");
        let project = Project::open(dir.path(), Config::default()).unwrap();

        let mut seen = Vec::new();
        let summary = project.run(&out, |p| seen.push(project.relative(p))).unwrap();

        assert_eq!(seen.len(), 3);
        assert_eq!(summary.scenes_found, 3);
        assert_eq!(summary.scenes_dumped, 3);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.scripts_used, 2);
        assert_eq!(summary.scripts_scanned, 3);

        let scenes: Vec<(&str, usize, usize, usize)> = summary
            .scenes
            .iter()
            .map(|s| (s.path.as_str(), s.records, s.lines, s.new_scripts))
            .collect();
        assert_eq!(
            scenes,
            vec![
                ("Assets/Scenes/Level.unity", 3, 1, 1),
                ("Assets/Scenes/Menu.unity", 4, 2, 0),
                ("Assets/Scenes/Sub/Hud.unity", 1, 0, 1),
            ]
        );
        assert_eq!(summary.records_read(), 8);
        assert_eq!(summary.lines_written(), 3);

        assert_eq!(fs::read_to_string(out.join("Menu.unity.dump")).unwrap(), "Root\n--Child");
        assert_eq!(fs::read_to_string(out.join("Level.unity.dump")).unwrap(), "Player");
        assert_eq!(fs::read_to_string(out.join("Hud.unity.dump")).unwrap(), "");
        assert_eq!(
            fs::read_to_string(out.join(REPORT_FILE)).unwrap(),
            "RelativePath,GUID\nAssets/Scripts/Legacy.cs,cccc0003"
        );
    }

    #[test]
    fn test_broken_scene_is_isolated() {
        let dir = sample_project();
        write(dir.path(), "Assets/Scenes/Broken.unity", "--- !u!1\nGameObject:\n  m_Name: x\n");
        let out = dir.path().join("out");
        let project = Project::open(dir.path(), Config::default()).unwrap();

        let summary = project.run(&out, |_| {}).unwrap();
        assert_eq!(summary.scenes_found, 4);
        assert_eq!(summary.scenes_dumped, 3);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, "Assets/Scenes/Broken.unity");
        assert!(summary.scenes.iter().all(|s| s.path != "Assets/Scenes/Broken.unity"));
        assert!(!out.join("Broken.unity.dump").exists());
        assert!(out.join("Menu.unity.dump").exists());
    }

    #[test]
    fn test_dangling_scene_still_harvested() {
        let dir = sample_project();
        let t1 = transform("2", &["404"]);
        let text = document(
            &[
                ("1", 4, t1.as_str()),
                ("2", 1, game_object("Root").as_str()),
                ("3", 114, mono_behaviour("2", "cccc0003").as_str()),
            ],
            Some(&["1"]),
        );
        write(dir.path(), "Assets/Scenes/Dangling.unity", &text);
        let out = dir.path().join("out");
        let project = Project::open(dir.path(), Config::default()).unwrap();

        let summary = project.run(&out, |_| {}).unwrap();
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].error.contains("404"));
        // Legacy.cs is used by the scene whose hierarchy failed
        assert!(summary.unused.is_empty());
    }

    #[test]
    fn test_fail_fast_aborts() {
        let dir = sample_project();
        write(dir.path(), "Assets/Scenes/Broken.unity", "--- !u!1\n");
        let config = Config {
            fail_fast: true,
            ..Config::default()
        };
        let project = Project::open(dir.path(), config).unwrap();
        let err = project.run(&dir.path().join("out"), |_| {}).unwrap_err();
        assert!(matches!(err, SceneError::MalformedDocument { .. }));
    }

    #[test]
    fn test_excludes_and_extensions() {
        let dir = sample_project();
        write(dir.path(), "Library/PackageCache/Pkg.cs.meta", &meta("eeee0005"));
        write(dir.path(), "Assets/Prefabs/Enemy.prefab", &document(
            &[
                ("1", 4, "Transform:\n  m_GameObject: {fileID: 2}\n  m_Children: []\n  m_Father: {fileID: 0}\n"),
                ("2", 1, "GameObject:\n  m_Name: Enemy\n"),
            ],
            None,
        ));

        let config = Config {
            scene_extensions: vec!["unity".to_string(), "prefab".to_string()],
            exclude: vec!["Library/**".to_string()],
            ..Config::default()
        };
        let out = dir.path().join("out");
        let project = Project::open(dir.path(), config).unwrap();
        let summary = project.run(&out, |_| {}).unwrap();

        assert_eq!(summary.scenes_found, 4);
        assert_eq!(summary.scripts_scanned, 3);
        assert_eq!(fs::read_to_string(out.join("Enemy.prefab.dump")).unwrap(), "Enemy");
    }

    #[test]
    fn test_excluded_directories_are_not_walked() {
        let dir = sample_project();
        write(dir.path(), "Library/PackageCache/Pkg.cs.meta", &meta("eeee0005"));
        write(dir.path(), "Library/Cache.unity", fixtures::SIMPLE_SCENE);
        let config = Config {
            exclude: vec!["Library/**".to_string()],
            ..Config::default()
        };
        let project = Project::open(dir.path(), config).unwrap();

        let library = dir.path().join("Library");
        let walked: Vec<PathBuf> = project
            .walk()
            .map(|entry| entry.unwrap().into_path())
            .collect();
        assert!(walked.iter().any(|p| p.ends_with("Assets/Scenes/Menu.unity")));
        assert!(walked.iter().all(|p| !p.starts_with(&library)));
        assert_eq!(project.scenes().unwrap().len(), 3);
    }

    #[test]
    fn test_unused_scripts_without_output() {
        let dir = sample_project();
        write(dir.path(), "Assets/Scripts/Odd.cs.meta", "fileFormatVersion: 2\n");
        let project = Project::open(dir.path(), Config::default()).unwrap();

        let (unused, failures) = project.unused_scripts(|_| {}).unwrap();
        assert_eq!(unused, vec![MetadataPair::new("Assets/Scripts/Legacy.cs", "cccc0003")]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "Assets/Scripts/Odd.cs.meta");
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_dump_file_name() {
        assert_eq!(dump_file_name(Path::new("a/b/Main.unity")), "Main.unity.dump");
    }
}
