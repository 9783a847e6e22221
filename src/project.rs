use std::path::{Component, Path, PathBuf};
use vfs::{PhysicalFS, VfsFileType, VfsPath};

/// The project root every alias value is expressed against.
///
/// Filesystem access always goes through `root`; `dir` is only used to turn
/// absolute host paths (as found in settings or bundler configs) into
/// root-relative ones.
#[derive(Clone, Debug)]
pub struct Project {
    root: VfsPath,
    dir: PathBuf,
}

impl Project {
    pub fn new(root: VfsPath, dir: impl Into<PathBuf>) -> Self {
        Self {
            root,
            dir: dir.into(),
        }
    }

    /// Open a project on the real filesystem.
    pub fn physical(dir: &Path) -> anyhow::Result<Self> {
        let dir = dir.canonicalize()?;
        let root: VfsPath = PhysicalFS::new(&dir).into();
        Ok(Self::new(root, dir))
    }

    pub fn root(&self) -> &VfsPath {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Express `value` relative to the project root.
    pub fn relativize(&self, value: &str) -> String {
        let p = Path::new(value);
        if p.is_absolute() {
            match pathdiff::diff_paths(p, &self.dir) {
                Some(rel) => normalize(&rel.to_string_lossy()),
                None => normalize(value),
            }
        } else {
            normalize(value)
        }
    }

    /// Express root-relative `target` relative to root-relative `base`. Either
    /// may step outside the root.
    pub fn relative_to(&self, base: &str, target: &str) -> String {
        let base = self.host_path(base);
        let target = self.host_path(target);
        match pathdiff::diff_paths(&target, &base) {
            Some(rel) => normalize(&rel.to_string_lossy()),
            None => normalize(&target.to_string_lossy()),
        }
    }

    /// Lexically resolved host path of a root-relative path.
    fn host_path(&self, rel: &str) -> PathBuf {
        let mut out = PathBuf::new();
        for comp in self.dir.join(normalize(rel)).components() {
            match comp {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                c => out.push(c),
            }
        }
        out
    }

    /// Join a root-relative path onto the project root.
    pub fn path(&self, rel: &str) -> anyhow::Result<VfsPath> {
        join(&self.root, rel)
    }

    /// Strip the root prefix off a path inside the project.
    pub fn rel_str<'a>(&self, path: &'a VfsPath) -> &'a str {
        let root_str = self.root.as_str().trim_end_matches('/');
        path.as_str()
            .strip_prefix(root_str)
            .unwrap_or(path.as_str())
            .trim_start_matches('/')
    }
}

/// Lexically normalize a `/`-separated relative path. The empty path is `.`.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for comp in unified.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(&last) if last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            c => parts.push(c),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// `VfsPath::join` rejects trailing separators, so normalize first.
pub fn join(dir: &VfsPath, rel: &str) -> anyhow::Result<VfsPath> {
    let rel = normalize(rel);
    if rel == "." {
        return Ok(dir.clone());
    }
    Ok(dir.join(&rel)?)
}

pub(crate) fn is_file(path: &VfsPath) -> bool {
    path.metadata()
        .map(|m| m.file_type == VfsFileType::File)
        .unwrap_or(false)
}
