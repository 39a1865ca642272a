use indexmap::IndexMap;

use super::ast::Library;

/// Supplies already-parsed library documents by identity.
pub trait DocumentResolver {
    /// Look up a library by its normalized path.
    fn resolve(&self, path: &str) -> Option<&Library>;
}

/// In-memory set of library documents keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct LibraryDocuments {
    documents: IndexMap<String, Library>,
}

impl LibraryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `library` under `path`. Returns the previous document at
    /// the same normalized path, if any.
    pub fn insert(&mut self, path: &str, library: Library) -> Option<Library> {
        self.documents.insert(normalize_path(path), library)
    }

    pub fn with(mut self, path: &str, library: Library) -> Self {
        self.insert(path, library);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl DocumentResolver for LibraryDocuments {
    fn resolve(&self, path: &str) -> Option<&Library> {
        self.documents.get(&normalize_path(path))
    }
}

/// Collapse `.` and `..` components and unify separators.
///
/// `..` that would climb above the first component is kept, so
/// `../shared/a.eligian` stays distinct from `shared/a.eligian`.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Resolve `import_path` as written inside the document at `importer`.
pub fn resolve_relative(importer: &str, import_path: &str) -> String {
    if import_path.starts_with('/') {
        return normalize_path(import_path);
    }
    let importer = importer.replace('\\', "/");
    match importer.rsplit_once('/') {
        Some((dir, _)) => normalize_path(&format!("{dir}/{import_path}")),
        None => normalize_path(import_path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(normalize_path("./lib/animations.eligian"), "lib/animations.eligian");
        assert_eq!(normalize_path("lib/../shared/a.eligian"), "shared/a.eligian");
        assert_eq!(normalize_path("../shared/a.eligian"), "../shared/a.eligian");
        assert_eq!(normalize_path("lib\\win.eligian"), "lib/win.eligian");
        assert_eq!(normalize_path("/abs/./x/../y.eligian"), "/abs/y.eligian");
        assert_eq!(normalize_path("/../y.eligian"), "/y.eligian");
    }

    #[test]
    fn resolves_against_importer_directory() {
        assert_eq!(resolve_relative("main.eligian", "./lib/a.eligian"), "lib/a.eligian");
        assert_eq!(resolve_relative("lib/a.eligian", "./b.eligian"), "lib/b.eligian");
        assert_eq!(resolve_relative("lib/a.eligian", "../c.eligian"), "c.eligian");
        assert_eq!(resolve_relative("lib/a.eligian", "/root/d.eligian"), "/root/d.eligian");
    }

    #[test]
    fn lookup_is_path_insensitive_to_dots() {
        let docs = LibraryDocuments::new().with(
            "./lib/a.eligian",
            Library { name: "a".into(), ..Library::default() },
        );
        assert_eq!(docs.resolve("lib/a.eligian").unwrap().name, "a");
        assert_eq!(docs.resolve("lib/x/../a.eligian").unwrap().name, "a");
        assert!(docs.resolve("lib/b.eligian").is_none());
    }
}
