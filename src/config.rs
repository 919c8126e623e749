use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};

/// name of the settings file looked up in the project root
pub const CONFIG_FILE_NAME: &str = "projpack.toml";

/// settings stored in projpack.toml
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectSection,
    pub traversal: TraversalSection,
    pub generator: GeneratorSection,
    /// literal replacements applied to packed content
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretRule>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub title: String,
    pub description: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            title: "Super-duper project".to_string(),
            description: "Short project description".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalSection {
    /// file masks to pack
    pub names_allowed: Vec<String>,
    /// file and directory masks to skip
    pub names_ignored: Vec<String>,
    pub use_gitignore: bool,
    /// files larger than this are dropped
    pub max_file_size: u64,
    /// directories that each form one group
    pub group_paths: Vec<String>,
    /// directories whose immediate subdirectories each form one group
    pub group_roots: Vec<String>,
}

impl Default for TraversalSection {
    fn default() -> Self {
        Self {
            names_allowed: ["*.cfg", "*.css", "*.ini", "*.js", "*.md", "*.php", "*.py", "*.txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            names_ignored: ["*.gpt", ".git", "logs", "temp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            use_gitignore: true,
            max_file_size: 1_000_000,
            group_paths: vec![],
            group_roots: vec![],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// destination root, relative to the project root unless absolute
    pub dest_folder: PathBuf,
    /// container size ceiling in bytes
    pub txt_size_max: u64,
    /// log file is trimmed to this many lines after each run (0 = never)
    pub log_max_lines: usize,
    /// number of builds retained (0 = all)
    pub builds_to_keep: usize,
    /// pack sibling stub files instead of their originals
    pub auto_redact: bool,
    /// extension of redaction stubs, without the dot
    pub stub_extension: String,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            dest_folder: PathBuf::from("projpack"),
            txt_size_max: 3_000_000,
            log_max_lines: 3000,
            builds_to_keep: 10,
            auto_redact: true,
            stub_extension: "gpt".to_string(),
        }
    }
}

/// replace `original` with `replacement` in files under `base`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRule {
    /// project-relative path prefix, "/" for the whole project
    pub base: String,
    pub original: String,
    pub replacement: String,
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// load `projpack.toml` from the project root, falling back to defaults
    pub fn load_or_default(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    /// write a default config file, refusing to overwrite an existing one
    pub fn init(project_root: &Path) -> Result<PathBuf> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Err(Error::ConfigExists(path));
        }
        Self::default().save(&path)?;
        Ok(path)
    }

    /// resolve into the settings record consumed by the pipeline
    pub fn into_settings(self, project_root: &Path) -> Result<Settings> {
        if !project_root.is_dir() {
            return Err(Error::NoProjectRoot(project_root.to_path_buf()));
        }
        if self.generator.txt_size_max == 0 {
            return Err(Error::InvalidSize("txt_size_max must be positive".to_string()));
        }
        if self.traversal.max_file_size == 0 {
            return Err(Error::InvalidSize("max_file_size must be positive".to_string()));
        }

        let dest_root = if self.generator.dest_folder.is_absolute() {
            self.generator.dest_folder.clone()
        } else {
            project_root.join(&self.generator.dest_folder)
        };

        // never pack our own output
        let mut deny_masks = self.traversal.names_ignored.clone();
        if let Ok(rel) = dest_root.strip_prefix(project_root) {
            let rel = rel.to_string_lossy().replace('\\', "/");
            if !rel.is_empty() {
                let mask = format!("/{}", glob::Pattern::escape(rel.trim_matches('/')));
                if !deny_masks.contains(&mask) {
                    deny_masks.push(mask);
                }
            }
        }

        Ok(Settings {
            project_root: project_root.to_path_buf(),
            title: self.project.title,
            description: self.project.description,
            allow_masks: self.traversal.names_allowed,
            deny_masks,
            use_gitignore: self.traversal.use_gitignore,
            max_file_size: self.traversal.max_file_size,
            max_container_size: self.generator.txt_size_max,
            group_paths: self.traversal.group_paths,
            group_roots: self.traversal.group_roots,
            dest_root,
            log_max_lines: self.generator.log_max_lines,
            builds_to_keep: self.generator.builds_to_keep,
            auto_redact: self.generator.auto_redact,
            stub_extension: self.generator.stub_extension,
            secrets: self.secrets,
        })
    }
}

/// settings record for one run
#[derive(Clone, Debug)]
pub struct Settings {
    pub project_root: PathBuf,
    pub title: String,
    pub description: String,
    pub allow_masks: Vec<String>,
    pub deny_masks: Vec<String>,
    pub use_gitignore: bool,
    pub max_file_size: u64,
    pub max_container_size: u64,
    pub group_paths: Vec<String>,
    pub group_roots: Vec<String>,
    pub dest_root: PathBuf,
    pub log_max_lines: usize,
    pub builds_to_keep: usize,
    pub auto_redact: bool,
    pub stub_extension: String,
    pub secrets: Vec<SecretRule>,
}

impl Settings {
    /// settings with defaults for the given project root
    pub fn for_root(project_root: &Path) -> Result<Self> {
        Config::default().into_settings(project_root)
    }

    /// human-readable dump for the log
    pub fn summary(&self) -> String {
        fn list(masks: &[String]) -> String {
            if masks.is_empty() {
                "(none)".to_string()
            } else {
                masks.join(";")
            }
        }

        [
            "settings:".to_string(),
            format!("  project_root: {}", self.project_root.display()),
            format!("  title: {}", self.title),
            format!("  description: {}", self.description),
            format!("  names_allowed: {}", list(&self.allow_masks)),
            format!("  names_ignored: {}", list(&self.deny_masks)),
            format!("  use_gitignore: {}", self.use_gitignore),
            format!("  max_file_size: {}", self.max_file_size),
            format!("  group_paths: {}", list(&self.group_paths)),
            format!("  group_roots: {}", list(&self.group_roots)),
            format!("  dest_root: {}", self.dest_root.display()),
            format!("  txt_size_max: {}", self.max_container_size),
            format!("  log_max_lines: {}", self.log_max_lines),
            format!("  builds_to_keep: {}", self.builds_to_keep),
            format!("  auto_redact: {}", self.auto_redact),
            format!("  secret rules: {}", self.secrets.len()),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = Config::default();
        config.traversal.group_roots = vec!["packages".to_string()];
        config.secrets.push(SecretRule {
            base: "/".to_string(),
            original: "hunter2".to_string(),
            replacement: "********".to_string(),
        });

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_partial_toml_keeps_defaults() {
        let toml_str = r#"
[traversal]
names_allowed = ["*.rs"]

[generator]
txt_size_max = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.traversal.names_allowed, vec!["*.rs".to_string()]);
        assert!(config.traversal.use_gitignore);
        assert_eq!(config.traversal.max_file_size, 1_000_000);
        assert_eq!(config.generator.txt_size_max, 500);
        assert_eq!(config.generator.dest_folder, PathBuf::from("projpack"));
        assert_eq!(config.project.title, "Super-duper project");
    }

    #[test]
    fn test_config_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = Config::init(dir.path()).unwrap();
        assert!(path.is_file());
        assert!(matches!(
            Config::init(dir.path()),
            Err(Error::ConfigExists(_))
        ));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_settings_deny_destination() {
        let dir = tempdir().unwrap();
        let settings = Settings::for_root(dir.path()).unwrap();
        assert_eq!(settings.dest_root, dir.path().join("projpack"));
        assert!(settings.deny_masks.contains(&"/projpack".to_string()));
        assert!(settings.deny_masks.contains(&".git".to_string()));
    }

    #[test]
    fn test_settings_deny_destination_with_glob_characters() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.generator.dest_folder = PathBuf::from("out[1]");
        let settings = config.into_settings(dir.path()).unwrap();

        let deny = crate::scan::MaskSet::compile(&settings.deny_masks).unwrap();
        assert!(deny.hits("out[1]", "out[1]"));
        assert!(!deny.hits("out1", "out1"));
    }

    #[test]
    fn test_settings_reject_zero_sizes() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.generator.txt_size_max = 0;
        assert!(matches!(
            config.into_settings(dir.path()),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn test_settings_missing_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            Config::default().into_settings(&missing),
            Err(Error::NoProjectRoot(_))
        ));
    }

    #[test]
    fn test_summary_lists_masks() {
        let dir = tempdir().unwrap();
        let settings = Settings::for_root(dir.path()).unwrap();
        let summary = settings.summary();
        assert!(summary.contains("*.py"));
        assert!(summary.contains("use_gitignore: true"));
    }
}
