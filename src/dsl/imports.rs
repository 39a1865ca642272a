//! Assembling the set of callable actions: library imports (transitive,
//! aliased, cycle-safe) followed by the program's own definitions.

use indexmap::IndexMap;

use super::ast::{ActionDefinition, Library, LibraryImport, Program};
use super::documents::{resolve_relative, DocumentResolver};

/// Where an action definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOrigin {
    Local,
    /// Normalized path of the library document that defines it.
    Library(String),
}

/// An action as seen by the caller: the shared definition plus an optional
/// name override from `import { x as y }`. The definition is never copied.
#[derive(Debug, Clone)]
pub struct LogicalAction<'a> {
    pub definition: &'a ActionDefinition,
    pub alias: Option<String>,
    pub origin: ActionOrigin,
}

impl<'a> LogicalAction<'a> {
    pub fn local(definition: &'a ActionDefinition) -> Self {
        Self {
            definition,
            alias: None,
            origin: ActionOrigin::Local,
        }
    }

    /// Name the action is called by.
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.definition.name)
    }

    pub fn is_endable(&self) -> bool {
        self.definition.is_endable()
    }

    /// Name the action is emitted under when it is reachable only from
    /// inside a library: `<library path>#<defined name>`.
    pub fn qualified_name(&self) -> String {
        match &self.origin {
            ActionOrigin::Local => self.definition.name.clone(),
            ActionOrigin::Library(path) => format!("{path}#{}", self.definition.name),
        }
    }

    fn renamed(&self, alias: Option<&str>) -> Self {
        Self {
            definition: self.definition,
            alias: alias.map(str::to_string).or_else(|| self.alias.clone()),
            origin: self.origin.clone(),
        }
    }
}

/// Last action called `name`. Later entries shadow earlier ones.
pub fn find_action_by_name<'c, 'a>(
    name: &str,
    candidates: &'c [LogicalAction<'a>],
) -> Option<&'c LogicalAction<'a>> {
    candidates.iter().rev().find(|a| a.name() == name)
}

/// Every action one compilation can reach.
#[derive(Debug, Clone, Default)]
pub struct ActionSet<'a> {
    /// Callable from the program: imports, then local definitions.
    pub program: Vec<LogicalAction<'a>>,
    /// Callable from inside each library body, keyed by normalized path.
    pub libraries: IndexMap<String, Vec<LogicalAction<'a>>>,
}

impl<'a> ActionSet<'a> {
    /// Actions visible to code defined at `origin`.
    pub fn visible_from(&self, origin: &ActionOrigin) -> &[LogicalAction<'a>] {
        match origin {
            ActionOrigin::Local => &self.program,
            ActionOrigin::Library(path) => self.libraries.get(path).map(Vec::as_slice).unwrap_or_default(),
        }
    }
}

/// Actions imported by `program`, in import order, without duplicates.
///
/// Unresolvable documents and names are skipped; reporting them is the
/// validator's job.
pub fn resolve_imports<'a>(
    program: &'a Program,
    documents: &'a dyn DocumentResolver,
) -> Vec<LogicalAction<'a>> {
    ImportResolver::new(documents).program_imports(program)
}

/// Imported actions followed by local definitions, plus the scope of every
/// library reached. A local definition with the same name as an import
/// replaces it.
pub fn collect_actions<'a>(program: &'a Program, documents: &'a dyn DocumentResolver) -> ActionSet<'a> {
    let mut resolver = ImportResolver::new(documents);
    let locals: Vec<LogicalAction<'a>> = program.actions().map(LogicalAction::local).collect();
    let mut actions: Vec<LogicalAction<'a>> = resolver
        .program_imports(program)
        .into_iter()
        .filter(|imported| {
            let shadowed = locals.iter().any(|l| l.name() == imported.name());
            if shadowed {
                tracing::warn!(action = imported.name(), "local action shadows imported action");
            }
            !shadowed
        })
        .collect();
    actions.extend(locals);
    ActionSet {
        program: actions,
        libraries: resolver.libraries,
    }
}

/// Import resolution for one compilation.
///
/// `chain` holds the libraries currently being resolved; `libraries` caches
/// the finished action list of each library so shared dependencies resolve
/// once.
struct ImportResolver<'a> {
    documents: &'a dyn DocumentResolver,
    chain: Vec<String>,
    libraries: IndexMap<String, Vec<LogicalAction<'a>>>,
}

impl<'a> ImportResolver<'a> {
    fn new(documents: &'a dyn DocumentResolver) -> Self {
        Self {
            documents,
            chain: Vec::new(),
            libraries: IndexMap::new(),
        }
    }

    fn program_imports(&mut self, program: &'a Program) -> Vec<LogicalAction<'a>> {
        let mut imported: Vec<LogicalAction<'a>> = Vec::new();
        for import in program.library_imports() {
            for action in self.resolve_import(import, "") {
                if imported.iter().any(|a| a.name() == action.name()) {
                    tracing::debug!(action = action.name(), "duplicate import ignored");
                    continue;
                }
                imported.push(action);
            }
        }
        imported
    }

    /// The named actions one import statement brings in.
    fn resolve_import(&mut self, import: &LibraryImport, importer: &str) -> Vec<LogicalAction<'a>> {
        let path = resolve_relative(importer, &import.path);
        let available = self.library_actions(&path);

        let mut resolved = Vec::new();
        for named in &import.actions {
            match find_action_by_name(&named.action, &available) {
                Some(action) => resolved.push(action.renamed(named.alias.as_deref())),
                None => tracing::debug!(
                    action = %named.action,
                    library = %path,
                    "import not found in library, skipping"
                ),
            }
        }
        resolved
    }

    /// Everything callable from inside the library at `path`: what it
    /// imports, then what it defines. A library already on the current
    /// import chain offers only its own definitions, which is what stops
    /// cycles.
    fn library_actions(&mut self, path: &str) -> Vec<LogicalAction<'a>> {
        if let Some(done) = self.libraries.get(path) {
            return done.clone();
        }
        let documents = self.documents;
        let Some(library) = documents.resolve(path) else {
            tracing::debug!(library = %path, "unresolved library import, skipping");
            return Vec::new();
        };
        if self.chain.iter().any(|p| p == path) {
            tracing::debug!(library = %path, "import cycle, using the library's own definitions");
            return defined_actions(library, path);
        }

        self.chain.push(path.to_string());
        let mut actions = Vec::new();
        for import in &library.imports {
            actions.extend(self.resolve_import(import, path));
        }
        self.chain.pop();

        actions.extend(defined_actions(library, path));
        self.libraries.insert(path.to_string(), actions.clone());
        actions
    }
}

fn defined_actions<'a>(library: &'a Library, path: &str) -> Vec<LogicalAction<'a>> {
    library
        .actions
        .iter()
        .map(|definition| LogicalAction {
            definition,
            alias: None,
            origin: ActionOrigin::Library(path.to_string()),
        })
        .collect()
}
