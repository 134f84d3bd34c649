use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_NAME;

#[derive(Error, Debug)]
pub enum AssetResolveError {
    #[error("mask asset not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write asset to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a mask asset reference to a readable local file.
///
/// Resolution order:
/// 1. `http(s)://` references: user cache, else download into the cache
/// 2. Absolute paths: used as-is
/// 3. Relative paths (a leading `/` is treated as relative, matching the
///    web-root style `"/masks/0.png"`): joined onto `assets_dir`
pub fn resolve(asset: &str, assets_dir: &Path) -> Result<PathBuf, AssetResolveError> {
    if is_remote(asset) {
        let cache_dir = asset_cache_dir()?;
        return resolve_remote(asset, &cache_dir);
    }
    resolve_local(asset, assets_dir)
}

pub fn is_remote(asset: &str) -> bool {
    asset.starts_with("http://") || asset.starts_with("https://")
}

fn resolve_local(asset: &str, assets_dir: &Path) -> Result<PathBuf, AssetResolveError> {
    let direct = Path::new(asset);
    let path = if direct.is_absolute() && direct.exists() {
        direct.to_path_buf()
    } else {
        assets_dir.join(asset.trim_start_matches('/'))
    };
    if path.exists() {
        Ok(path)
    } else {
        Err(AssetResolveError::NotFound(path))
    }
}

fn resolve_remote(url: &str, cache_dir: &Path) -> Result<PathBuf, AssetResolveError> {
    let cached_path = cache_dir.join(cache_file_name(url));
    if cached_path.exists() {
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(AssetResolveError::CacheDir)?;
    download(url, &cached_path)?;
    Ok(cached_path)
}

/// Flattens a URL into a single file name so different hosts serving
/// `0.png` don't collide in the cache.
fn cache_file_name(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    stripped
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Platform-specific mask cache directory.
///
/// - macOS: `~/Library/Application Support/BreakABoo/masks/`
/// - Linux: `$XDG_CACHE_HOME/BreakABoo/masks/` or `~/.cache/BreakABoo/masks/`
/// - Windows: `%LOCALAPPDATA%/BreakABoo/masks/`
pub fn asset_cache_dir() -> Result<PathBuf, AssetResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_NAME).join("masks"))
            .ok_or(AssetResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_NAME).join("masks"))
            .ok_or(AssetResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), AssetResolveError> {
    let bytes = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| AssetResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;
    write_atomically(dest, &bytes)?;
    log::info!("Downloaded {url} ({} bytes)", bytes.len());
    Ok(())
}

/// Writes to `<dest>.part`, then renames, so a failed write never leaves a
/// truncated file where the cache expects a complete one.
fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), AssetResolveError> {
    let temp_path = dest.with_extension("part");
    fs::write(&temp_path, bytes).map_err(|e| AssetResolveError::Write {
        path: temp_path.clone(),
        source: e,
    })?;
    fs::rename(&temp_path, dest).map_err(|e| AssetResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_relative_asset_under_assets_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("masks")).unwrap();
        let mask = tmp.path().join("masks").join("3.png");
        fs::write(&mask, b"png").unwrap();

        let resolved = resolve("masks/3.png", tmp.path()).unwrap();
        assert_eq!(resolved, mask);
    }

    #[test]
    fn test_web_root_style_path_is_relative() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("masks")).unwrap();
        let mask = tmp.path().join("masks").join("0.png");
        fs::write(&mask, b"png").unwrap();

        let resolved = resolve("/masks/0.png", tmp.path()).unwrap();
        assert_eq!(resolved, mask);
    }

    #[test]
    fn test_absolute_existing_path_is_used_directly() {
        let tmp = TempDir::new().unwrap();
        let mask = tmp.path().join("skull.png");
        fs::write(&mask, b"png").unwrap();

        let elsewhere = TempDir::new().unwrap();
        let resolved = resolve(mask.to_str().unwrap(), elsewhere.path()).unwrap();
        assert_eq!(resolved, mask);
    }

    #[test]
    fn test_missing_local_asset_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = resolve("masks/99.png", tmp.path()).unwrap_err();
        assert!(matches!(err, AssetResolveError::NotFound(_)));
    }

    #[test]
    fn test_remote_asset_served_from_cache() {
        let cache = TempDir::new().unwrap();
        let url = "https://example.com/masks/7.png";
        let cached = cache.path().join(cache_file_name(url));
        fs::write(&cached, b"cached").unwrap();

        let resolved = resolve_remote(url, cache.path()).unwrap();
        assert_eq!(resolved, cached);
    }

    #[test]
    fn test_cache_file_name_is_flat() {
        let name = cache_file_name("https://cdn.example.com/masks/0.png?v=2");
        assert!(!name.contains('/'));
        assert!(!name.contains('?'));
        assert!(name.starts_with("cdn.example.com"));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("http://example.com/a.png"));
        assert!(!is_remote("masks/a.png"));
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("mask.png");
        let result = download("http://invalid.nonexistent.example.com/mask.png", &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_write_atomically_replaces_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("mask.png");
        fs::write(dest.with_extension("part"), b"trunc").unwrap();

        write_atomically(&dest, b"complete mask").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"complete mask");
        assert!(!dest.with_extension("part").exists());
    }

    #[test]
    fn test_write_atomically_into_missing_dir_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("missing").join("mask.png");
        let err = write_atomically(&dest, b"data").unwrap_err();
        assert!(matches!(err, AssetResolveError::Write { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_asset_cache_dir_is_app_scoped() {
        let dir = asset_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains(APP_NAME));
        assert!(dir.ends_with("masks"));
    }
}
