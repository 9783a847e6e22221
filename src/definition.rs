use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use vfs::VfsPath;

use crate::project::join;
use crate::resolve::{CancelToken, fix_file_path_extension, resolve_import_path};
use crate::{AliasMap, LogLevel, Logger, Project};

const STYLE_EXTENSIONS: &[&str] = &["less", "scss", "sass"];
const TEMPLATE_EXTENSIONS: &[&str] = &["vue"];

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:\bfrom\s*|\bimport\s*\(?\s*|\brequire\s*\(\s*|@import\s+(?:url\(\s*)?)['"]([^'"]+)['"]"#,
    )
    .expect("import pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportReference {
    pub path: String,
    /// Range of `path` within the line, in UTF-16 code units as editors
    /// count columns.
    pub range: Range<usize>,
}

#[derive(Clone, Debug)]
pub struct Location {
    pub path: VfsPath,
    pub line: u32,
    pub character: u32,
}

/// An open source file: its location and text.
pub struct Document {
    pub path: VfsPath,
    pub text: String,
}

/// First module specifier on `line`.
pub fn extract_import_path_from_text_line(line: &str) -> Option<ImportReference> {
    let caps = IMPORT_RE.captures(line)?;
    let m = caps.get(1)?;
    let start = line[..m.start()].encode_utf16().count();
    let len = m.as_str().encode_utf16().count();
    Some(ImportReference {
        path: m.as_str().to_string(),
        range: start..start + len,
    })
}

pub fn get_file_zero_location_from_file_path(path: VfsPath) -> Location {
    Location {
        path,
        line: 0,
        character: 0,
    }
}

fn extension(path: &str) -> &str {
    path.rsplit_once('.')
        .filter(|(_, ext)| !ext.contains('/'))
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// Relative imports editors tend not to follow on their own.
fn needs_relative_jump(document: &Document, import: &str) -> bool {
    import.starts_with('.')
        && (STYLE_EXTENSIONS.contains(&extension(import))
            || TEMPLATE_EXTENSIONS.contains(&extension(&document.path.filename())))
}

/// Jump-to-definition for import paths.
pub struct DefinitionProvider<'a> {
    project: &'a Project,
    logger: &'a dyn Logger,
}

impl<'a> DefinitionProvider<'a> {
    pub fn new(project: &'a Project, logger: &'a dyn Logger) -> Self {
        Self { project, logger }
    }

    /// `alias` is the table snapshot to resolve against; `line` and
    /// `character` are zero based, `character` in UTF-16 code units.
    pub fn provide_definition(
        &self,
        alias: &AliasMap,
        document: &Document,
        line: usize,
        character: usize,
        cancel: &CancelToken,
    ) -> Option<Location> {
        let text_line = document.text.lines().nth(line)?;
        let import = extract_import_path_from_text_line(text_line)?;
        if !import.range.contains(&character) {
            return None;
        }
        let candidate = self.candidate(alias, document, &import.path)?;
        let found = fix_file_path_extension(&candidate, cancel)?;
        self.logger.log(
            LogLevel::Debug,
            &format!("{} -> {}", import.path, found.as_str()),
        );
        Some(get_file_zero_location_from_file_path(found))
    }

    fn candidate(&self, alias: &AliasMap, document: &Document, import: &str) -> Option<VfsPath> {
        if let Some(rel) = resolve_import_path(alias, import) {
            return self.project.path(&rel).ok();
        }
        if needs_relative_jump(document, import) {
            return join(&document.path.parent(), import).ok();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmptyLogger;
    use crate::test_util::TestFS;

    fn document(fs: &TestFS, path: &str, text: &str) -> Document {
        Document {
            path: fs.root().join(path).unwrap(),
            text: text.to_string(),
        }
    }

    fn alias() -> AliasMap {
        [("@", "src"), ("@utils", "src/utils")].into_iter().collect()
    }

    fn lookup(fs: &TestFS, doc: &Document, line: usize, character: usize) -> Option<String> {
        let project = fs.project();
        let provider = DefinitionProvider::new(&project, &EmptyLogger);
        provider
            .provide_definition(&alias(), doc, line, character, &CancelToken::new())
            .map(|loc| project.rel_str(&loc.path).to_string())
    }

    #[test]
    fn test_extract_import_path() {
        let r = extract_import_path_from_text_line("import Foo from '@/components/Foo'").unwrap();
        assert_eq!(r.path, "@/components/Foo");
        assert_eq!(r.range, 17..33);

        let r = extract_import_path_from_text_line("const x = require(\"@utils/x\");").unwrap();
        assert_eq!(r.path, "@utils/x");
        let r = extract_import_path_from_text_line("@import '../styles/base.scss';").unwrap();
        assert_eq!(r.path, "../styles/base.scss");
        let r = extract_import_path_from_text_line("import './side-effect';").unwrap();
        assert_eq!(r.path, "./side-effect");
        let r = extract_import_path_from_text_line("const m = await import('@/lazy');").unwrap();
        assert_eq!(r.path, "@/lazy");
        assert!(extract_import_path_from_text_line("const x = 'from nowhere';").is_none());
    }

    #[test]
    fn test_import_range_in_utf16_units() {
        let r = extract_import_path_from_text_line("/* 🎉 */ import x from '@/a'").unwrap();
        assert_eq!(r.path, "@/a");
        assert_eq!(r.range, 24..27);

        let fs = TestFS::new([("src/a.ts", "")]);
        let doc = document(&fs, "src/main.ts", "/* 🎉 */ import x from '@/a'");
        assert_eq!(lookup(&fs, &doc, 0, 26).as_deref(), Some("src/a.ts"));
        assert_eq!(lookup(&fs, &doc, 0, 27), None);
    }

    #[test]
    fn test_alias_lookup_probes_extensions() {
        let fs = TestFS::new([("src/utils/helpers.ts", "")]);
        let doc = document(&fs, "src/main.ts", "import { h } from '@utils/helpers';\n");
        assert_eq!(lookup(&fs, &doc, 0, 22).as_deref(), Some("src/utils/helpers.ts"));
    }

    #[test]
    fn test_cursor_outside_import_path() {
        let fs = TestFS::new([("src/utils/helpers.ts", "")]);
        let doc = document(&fs, "src/main.ts", "import { h } from '@utils/helpers';\n");
        assert_eq!(lookup(&fs, &doc, 0, 3), None);
        assert_eq!(lookup(&fs, &doc, 5, 0), None);
    }

    #[test]
    fn test_unknown_alias_yields_nothing() {
        let fs = TestFS::new([("src/utils/helpers.ts", "")]);
        let doc = document(&fs, "src/main.ts", "import x from '~/utils/helpers';");
        assert_eq!(lookup(&fs, &doc, 0, 18), None);
    }

    #[test]
    fn test_relative_style_import() {
        let fs = TestFS::new([("src/styles/base.scss", "")]);
        let doc = document(&fs, "src/app/app.scss", "@import '../styles/base.scss';");
        assert_eq!(lookup(&fs, &doc, 0, 12).as_deref(), Some("src/styles/base.scss"));
    }

    #[test]
    fn test_relative_import_in_vue_file() {
        let fs = TestFS::new([("src/components/Card/index.vue", "")]);
        let doc = document(
            &fs,
            "src/views/Home.vue",
            "<script>\nimport Card from '../components/Card';\n</script>",
        );
        assert_eq!(
            lookup(&fs, &doc, 1, 20).as_deref(),
            Some("src/components/Card/index.vue")
        );
    }

    #[test]
    fn test_relative_import_in_plain_script_left_to_editor() {
        let fs = TestFS::new([("src/b.ts", "")]);
        let doc = document(&fs, "src/a.ts", "import b from './b';");
        assert_eq!(lookup(&fs, &doc, 0, 16), None);
    }

    #[test]
    fn test_cancelled_lookup() {
        let fs = TestFS::new([("src/utils/helpers.ts", "")]);
        let doc = document(&fs, "src/main.ts", "import { h } from '@utils/helpers';");
        let project = fs.project();
        let provider = DefinitionProvider::new(&project, &EmptyLogger);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(
            provider
                .provide_definition(&alias(), &doc, 0, 22, &cancel)
                .is_none()
        );
    }
}
