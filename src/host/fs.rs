use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{HostError, HostResult, ResourceLoader};

pub const PACKAGES_PREFIX: &str = "Packages/";
pub const USER_PACKAGE: &str = "User";

/// Resolves logical `Packages/<package>/<file>` paths against one or more
/// package roots on disk. Plain filesystem paths are read as-is.
#[derive(Debug, Clone, Default)]
pub struct FsResourceLoader {
    roots: Vec<PathBuf>,
}

impl FsResourceLoader {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn candidates(&self, path: &str) -> Vec<PathBuf> {
        match path.strip_prefix(PACKAGES_PREFIX) {
            Some(relative) => self.roots.iter().map(|root| root.join(relative)).collect(),
            None => vec![PathBuf::from(path)],
        }
    }

    fn package_dirs(&self) -> HostResult<Vec<(String, PathBuf)>> {
        let mut packages = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                continue;
            }
            let entries = fs::read_dir(root).map_err(|source| io_error(root, source))?;
            for entry in entries {
                let entry = entry.map_err(|source| io_error(root, source))?;
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    packages.push((name.to_string(), path.clone()));
                }
            }
        }
        packages.sort_by(|(a, _), (b, _)| {
            (a == USER_PACKAGE, a.to_lowercase()).cmp(&(b == USER_PACKAGE, b.to_lowercase()))
        });
        Ok(packages)
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load_bytes(&self, path: &str) -> HostResult<Vec<u8>> {
        let path = normalize_resource_path(path);
        for candidate in self.candidates(&path) {
            match fs::read(&candidate) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(io_error(&candidate, source)),
            }
        }
        Err(HostError::NotFound(path))
    }

    fn find_resources(&self, file_name: &str) -> HostResult<Vec<String>> {
        let mut found: Vec<String> = Vec::new();
        for (package, dir) in self.package_dirs()? {
            if dir.join(file_name).is_file() {
                let logical = format!("{PACKAGES_PREFIX}{package}/{file_name}");
                if !found.contains(&logical) {
                    found.push(logical);
                }
            }
        }
        Ok(found)
    }
}

/// Normalize separators so `Packages\User\x` and `Packages/User/x` compare equal.
pub fn normalize_resource_path(path: &str) -> String {
    path.trim().replace('\\', "/")
}

/// True when `path` lives in the user's own package, which always layers last.
pub fn is_user_resource(path: &str) -> bool {
    normalize_resource_path(path)
        .strip_prefix(PACKAGES_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|package| package == USER_PACKAGE)
}

fn io_error(path: &Path, source: io::Error) -> HostError {
    HostError::Io {
        path: path.display().to_string(),
        source,
    }
}
