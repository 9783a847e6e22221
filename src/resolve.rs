use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use vfs::VfsPath;

use crate::AliasMap;
use crate::project::{is_file, normalize};

/// Probe order for extensionless imports. Also the set of suffixes that mark
/// an alias target as a file rather than a directory.
pub const EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts", "vue", "json", "css", "less", "scss",
    "sass",
];

pub(crate) fn has_known_extension(path: &str) -> bool {
    EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Substitute the alias token at the head of `raw` and return the
/// root-relative path it points to.
pub fn resolve_import_path(alias: &AliasMap, raw: &str) -> Option<String> {
    let head = raw.split('/').next()?;
    let (key, value) = alias.iter().find(|(key, _)| *key == head)?;
    if raw == key {
        return Some(normalize(value));
    }
    let rest = raw.strip_prefix(&format!("{key}/"))?;
    let mut value = value.to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    Some(normalize(&format!("{value}{rest}")))
}

/// Find the existing file an import most likely names: the path itself, a
/// known extension appended, or an `index` file inside it.
pub fn fix_file_path_extension(candidate: &VfsPath, cancel: &CancelToken) -> Option<VfsPath> {
    if cancel.is_cancelled() {
        return None;
    }
    if is_file(candidate) {
        return Some(candidate.clone());
    }
    let parent = candidate.parent();
    let name = candidate.filename();
    for ext in EXTENSIONS {
        if cancel.is_cancelled() {
            return None;
        }
        if let Ok(p) = parent.join(format!("{name}.{ext}")) {
            if is_file(&p) {
                return Some(p);
            }
        }
    }
    for ext in EXTENSIONS {
        if cancel.is_cancelled() {
            return None;
        }
        if let Ok(p) = candidate.join(format!("index.{ext}")) {
            if is_file(&p) {
                return Some(p);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestFS;
    use proptest::prelude::*;

    fn utils() -> AliasMap {
        [("@utils", "src/utils")].into_iter().collect()
    }

    #[test]
    fn test_alias_substitution() {
        assert_eq!(
            resolve_import_path(&utils(), "@utils/helpers").as_deref(),
            Some("src/utils/helpers")
        );
        assert_eq!(resolve_import_path(&utils(), "@missing/x"), None);
    }

    #[test]
    fn test_alias_needs_whole_segment() {
        assert_eq!(resolve_import_path(&utils(), "@utilsx/helpers"), None);
        assert_eq!(resolve_import_path(&utils(), "./@utils/helpers"), None);
    }

    #[test]
    fn test_bare_alias_and_trailing_slash_value() {
        let alias: AliasMap = [("@c", "src/components/Button.vue"), ("~", "src/")]
            .into_iter()
            .collect();
        assert_eq!(
            resolve_import_path(&alias, "@c").as_deref(),
            Some("src/components/Button.vue")
        );
        assert_eq!(
            resolve_import_path(&alias, "~/a/b").as_deref(),
            Some("src/a/b")
        );
    }

    #[test]
    fn test_probe_existing_file_first() {
        let fs = TestFS::new([("src/a.ts", ""), ("src/a.ts.js", "")]);
        let project = fs.project();
        let found =
            fix_file_path_extension(&project.path("src/a.ts").unwrap(), &CancelToken::new())
                .unwrap();
        assert_eq!(project.rel_str(&found), "src/a.ts");
    }

    #[test]
    fn test_probe_extension_order() {
        let fs = TestFS::new([("src/a.tsx", ""), ("src/a.vue", "")]);
        let project = fs.project();
        let found = fix_file_path_extension(&project.path("src/a").unwrap(), &CancelToken::new())
            .unwrap();
        assert_eq!(project.rel_str(&found), "src/a.tsx");
    }

    #[test]
    fn test_probe_index_file() {
        let fs = TestFS::new([("src/components/index.vue", "")]);
        let project = fs.project();
        let found = fix_file_path_extension(
            &project.path("src/components").unwrap(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(project.rel_str(&found), "src/components/index.vue");
    }

    #[test]
    fn test_probe_nothing_matches() {
        let fs = TestFS::new([("src/b.ts", "")]);
        let project = fs.project();
        assert!(
            fix_file_path_extension(&project.path("src/a").unwrap(), &CancelToken::new())
                .is_none()
        );
    }

    #[test]
    fn test_cancelled_probe_returns_nothing() {
        let fs = TestFS::new([("src/a.ts", "")]);
        let project = fs.project();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(fix_file_path_extension(&project.path("src/a").unwrap(), &cancel).is_none());
    }

    proptest! {
        #[test]
        fn prop_substitution_keeps_rest(
            key in "@[a-z]{1,6}",
            target in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
            rest in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
        ) {
            let alias: AliasMap = [(key.clone(), target.clone())].into_iter().collect();
            let resolved = resolve_import_path(&alias, &format!("{key}/{rest}"));
            prop_assert_eq!(resolved, Some(format!("{target}/{rest}")));
        }
    }
}
