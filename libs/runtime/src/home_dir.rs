use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the application home directory to an absolute path.
///
/// `None` (or an empty string) selects `$HOME/<default_subdir>`. A leading
/// `~` expands to the user's home; other relative paths resolve against
/// the current directory. With `create`, the directory is created.
pub fn resolve_home_dir(
    raw: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => user_home()?.join(default_subdir),
        Some(p) => expand(p)?,
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create home dir {}", path.display()))?;
    }
    Ok(path)
}

fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot determine the user's home directory"))
}

fn expand(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    let p = Path::new(raw);
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot read current directory")?;
    Ok(cwd.join(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("nested/home");
        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().into_owned()), ".unused", true).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn tilde_expands_to_user_home() {
        let resolved = resolve_home_dir(Some("~/.listing_home_test".into()), ".unused", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(".listing_home_test"));
    }

    #[test]
    fn blank_selects_default_subdir() {
        let resolved = resolve_home_dir(Some("  ".into()), ".listing-query", false).unwrap();
        assert!(resolved.ends_with(".listing-query"));
    }

    #[test]
    fn relative_resolves_against_cwd() {
        let resolved = resolve_home_dir(Some("data/home".into()), ".unused", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("data/home"));
    }
}
