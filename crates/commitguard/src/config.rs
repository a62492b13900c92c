//! Configuration loading: `${VAR}` expansion, `includes` resolution, merging.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

use commitguard_types::{CheckSelection, ConfigFile, Defaults};

/// Maximum depth for include resolution.
const MAX_INCLUDE_DEPTH: usize = 10;

/// Load a configuration file, resolving its `includes` transitively.
///
/// Included files are merged in order and the including file is applied
/// last, so it wins over everything it includes.
pub fn load_config_with_includes<F>(path: &Path, expand_env: F) -> Result<ConfigFile>
where
    F: Fn(&str) -> Result<String> + Copy,
{
    let mut visited = HashSet::new();
    load_config_recursive(path, expand_env, &mut visited, 0)
}

fn load_config_recursive<F>(
    path: &Path,
    expand_env: F,
    visited: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<ConfigFile>
where
    F: Fn(&str) -> Result<String> + Copy,
{
    if depth > MAX_INCLUDE_DEPTH {
        bail!(
            "Include depth exceeded maximum of {} levels at '{}'",
            MAX_INCLUDE_DEPTH,
            path.display()
        );
    }

    let canonical = path
        .canonicalize()
        .with_context(|| format!("canonicalize path '{}'", path.display()))?;
    if !visited.insert(canonical) {
        bail!("Circular include detected: '{}'", path.display());
    }

    debug!("Loading config from '{}' (depth {})", path.display(), depth);

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    let expanded = expand_env(&text)?;
    let config: ConfigFile =
        toml::from_str(&expanded).with_context(|| format!("parse config '{}'", path.display()))?;

    if config.includes.is_empty() {
        return Ok(config);
    }

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut merged = ConfigFile::default();
    for include_path in &config.includes {
        let full_path = base_dir.join(include_path);
        debug!(
            "Resolving include '{}' relative to '{}'",
            include_path,
            base_dir.display()
        );
        if !full_path.exists() {
            bail!(
                "Included config file not found: '{}' (resolved from '{}')",
                full_path.display(),
                include_path
            );
        }
        let included = load_config_recursive(&full_path, expand_env, visited, depth + 1)?;
        merged = merge_configs(merged, included);
    }

    let own = ConfigFile {
        includes: vec![],
        defaults: config.defaults,
        checks: config.checks,
    };
    Ok(merge_configs(merged, own))
}

/// Applies `other` on top of `base`.
///
/// Defaults merge key by key. A non-empty include list replaces the base
/// list; exclude lists accumulate.
fn merge_configs(base: ConfigFile, other: ConfigFile) -> ConfigFile {
    let defaults = Defaults {
        commits: other.defaults.commits.or(base.defaults.commits),
        output: other.defaults.output.or(base.defaults.output),
        case_output_dir: other
            .defaults
            .case_output_dir
            .or(base.defaults.case_output_dir),
        no_case_output: other
            .defaults
            .no_case_output
            .or(base.defaults.no_case_output),
        annotate: other.defaults.annotate.or(base.defaults.annotate),
    };

    let include = if other.checks.include.is_empty() {
        base.checks.include
    } else {
        other.checks.include
    };
    let mut exclude = base.checks.exclude;
    for name in other.checks.exclude {
        if !exclude.iter().any(|e| e.eq_ignore_ascii_case(&name)) {
            exclude.push(name);
        }
    }

    ConfigFile {
        includes: vec![],
        defaults,
        checks: CheckSelection { include, exclude },
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// `${VAR}` with `VAR` unset is an error.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .context("compile env var pattern")?;

    let mut result = String::with_capacity(content.len());
    let mut last_end = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        result.push_str(&content[last_end..full_match.start()]);

        match std::env::var(var_name) {
            Ok(value) if !value.is_empty() || default_value.is_none() => {
                debug!("Expanded env var ${{{}}}", var_name);
                result.push_str(&value);
            }
            _ => match default_value {
                Some(default) => {
                    debug!(
                        "Env var ${{{0}}} not set, using default: {1}",
                        var_name, default
                    );
                    result.push_str(default);
                }
                None => bail!(
                    "Environment variable '{}' is not set and no default provided",
                    var_name
                ),
            },
        }

        last_end = full_match.end();
    }

    result.push_str(&content[last_end..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_expand(s: &str) -> Result<String> {
        Ok(s.to_string())
    }

    #[test]
    fn simple_config_without_includes() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("commitguard.toml");
        fs::write(
            &path,
            r#"
[defaults]
commits = "origin/main..HEAD"
annotate = true

[checks]
exclude = ["Checkpatch"]
"#,
        )
        .expect("write");

        let cfg = load_config_with_includes(&path, no_expand).expect("load");
        assert_eq!(cfg.defaults.commits.as_deref(), Some("origin/main..HEAD"));
        assert_eq!(cfg.defaults.annotate, Some(true));
        assert_eq!(cfg.checks.exclude, vec!["Checkpatch"]);
    }

    #[test]
    fn including_file_wins_key_by_key() {
        let temp = TempDir::new().expect("temp");
        fs::write(
            temp.path().join("base.toml"),
            r#"
[defaults]
commits = "base..HEAD"
output = "base.xml"

[checks]
include = ["Identity", "Gitlint"]
exclude = ["Gitlint"]
"#,
        )
        .expect("write");
        let main = temp.path().join("main.toml");
        fs::write(
            &main,
            r#"
includes = ["base.toml"]

[defaults]
output = "main.xml"

[checks]
exclude = ["Checkpatch", "gitlint"]
"#,
        )
        .expect("write");

        let cfg = load_config_with_includes(&main, no_expand).expect("load");
        assert_eq!(cfg.defaults.commits.as_deref(), Some("base..HEAD"));
        assert_eq!(cfg.defaults.output.as_deref(), Some("main.xml"));
        assert_eq!(cfg.checks.include, vec!["Identity", "Gitlint"]);
        assert_eq!(cfg.checks.exclude, vec!["Gitlint", "Checkpatch"]);
        assert!(cfg.includes.is_empty());
    }

    #[test]
    fn circular_include_detected() {
        let temp = TempDir::new().expect("temp");
        let a = temp.path().join("a.toml");
        fs::write(&a, "includes = [\"b.toml\"]\n").expect("write");
        fs::write(temp.path().join("b.toml"), "includes = [\"a.toml\"]\n").expect("write");

        let err = load_config_with_includes(&a, no_expand).unwrap_err();
        assert!(err.to_string().contains("Circular include"));
    }

    #[test]
    fn missing_include_errors() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("commitguard.toml");
        fs::write(&path, "includes = [\"nonexistent.toml\"]\n").expect("write");

        let err = load_config_with_includes(&path, no_expand).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn include_depth_limit() {
        let temp = TempDir::new().expect("temp");
        for i in 0..=MAX_INCLUDE_DEPTH + 1 {
            let path = temp.path().join(format!("level{i}.toml"));
            if i < MAX_INCLUDE_DEPTH + 1 {
                fs::write(&path, format!("includes = [\"level{}.toml\"]\n", i + 1))
                    .expect("write");
            } else {
                fs::write(&path, "").expect("write");
            }
        }

        let err = load_config_with_includes(&temp.path().join("level0.toml"), no_expand)
            .unwrap_err();
        assert!(err.to_string().contains("Include depth exceeded"));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("bad.toml");
        fs::write(&path, "defaults = [").expect("write");

        let err = load_config_with_includes(&path, no_expand).unwrap_err();
        assert!(err.to_string().contains("parse config"));
    }

    #[test]
    fn expand_env_error_propagates() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("commitguard.toml");
        fs::write(&path, "[defaults]\n").expect("write");

        let expand = |_s: &str| -> Result<String> { bail!("expand failed") };
        let err = load_config_with_includes(&path, expand).unwrap_err();
        assert!(err.to_string().contains("expand failed"));
    }

    #[test]
    fn env_defaults_apply_when_unset() {
        let out = expand_env_vars(
            "commits = \"${COMMITGUARD_TEST_SURELY_UNSET_VAR:-HEAD~3..HEAD}\"",
        )
        .expect("expand");
        assert_eq!(out, "commits = \"HEAD~3..HEAD\"");
    }

    #[test]
    fn env_required_var_missing_is_an_error() {
        let err = expand_env_vars("output = \"${COMMITGUARD_TEST_SURELY_UNSET_VAR}\"").unwrap_err();
        assert!(err.to_string().contains("COMMITGUARD_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn env_text_without_references_is_unchanged() {
        let text = "[defaults]\nannotate = true\nprice = \"$5\"\n";
        assert_eq!(expand_env_vars(text).expect("expand"), text);
    }
}
