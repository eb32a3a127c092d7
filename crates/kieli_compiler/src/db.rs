//! The compiler database.
//!
//! A [`Database`] owns every open document, the process-wide string
//! pool, and the configuration that decides which analysis results are
//! collected. Each [`Document`] owns the arenas for its syntax trees,
//! environments, and symbols; closing a client document deallocates all
//! of it at once.
//!
//! The `add_*` collector functions are the single code path through
//! which analysis results reach a document. Each checks its
//! [`Configuration`] flag and is a no-op when the feature is disabled,
//! so the resolver never branches on client capabilities.

use crate::lsp::{self, Diagnostic, Reference, SemanticToken, SemanticTokenType};
use crate::{ast, cst, hir, Name};
use kieli_base::{define_id, Arena, Position, Range, StringId, StringPool};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

define_id!(DocumentId);
define_id!(EnvironmentId);
define_id!(SymbolId);
define_id!(ScopeId);

/// What a name resolves to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolVariant {
    Error,
    Function(hir::FunctionId),
    Structure(hir::StructureId),
    Enumeration(hir::EnumerationId),
    Constructor(hir::ConstructorId),
    Field(hir::FieldId),
    Concept(hir::ConceptId),
    Alias(hir::AliasId),
    Module(hir::ModuleId),
    LocalVariable(hir::LocalVariableId),
    LocalMutability(hir::LocalMutabilityId),
    LocalType(hir::LocalTypeId),
}

/// A resolved declaration.
#[derive(Clone, Copy, Debug)]
pub struct Symbol {
    pub variant: SymbolVariant,
    pub name: Name,
    /// Incremented for every reference; unused-symbol diagnostics key
    /// off a count of zero.
    pub use_count: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnvironmentKind {
    Root,
    Module,
    Scope,
    Type,
}

/// A name → symbol map with a parent link.
///
/// Environments form a DAG rooted at the per-document root environment;
/// unqualified lookup walks the parent chain. `in_order` remembers
/// insertion order for deterministic iteration and completion listings.
pub struct Environment {
    pub map: HashMap<StringId, SymbolId>,
    pub in_order: Vec<SymbolId>,
    pub parent_id: Option<EnvironmentId>,
    pub name_id: Option<StringId>,
    pub doc_id: DocumentId,
    pub kind: EnvironmentKind,
}

impl Environment {
    pub fn root(doc_id: DocumentId) -> Environment {
        Environment {
            map: HashMap::new(),
            in_order: Vec::new(),
            parent_id: None,
            name_id: None,
            doc_id,
            kind: EnvironmentKind::Root,
        }
    }
}

/// A local variable binding in a scope.
#[derive(Clone, Copy, Debug)]
pub struct VariableBind {
    pub name: Name,
    pub local_id: hir::LocalVariableId,
    pub symbol_id: SymbolId,
    pub mentioned: bool,
}

/// A local mutability binding in a scope.
#[derive(Clone, Copy, Debug)]
pub struct MutabilityBind {
    pub name: Name,
    pub local_id: hir::LocalMutabilityId,
    pub symbol_id: SymbolId,
    pub mentioned: bool,
}

/// A local type binding in a scope.
#[derive(Clone, Copy, Debug)]
pub struct TypeBind {
    pub name: Name,
    pub local_id: hir::LocalTypeId,
    pub symbol_id: SymbolId,
    pub mentioned: bool,
}

/// A nested block environment for local bindings.
///
/// Scopes are pushed for blocks, match arms, and function bodies, and
/// killed when resolution leaves them; the `mentioned` flags feed
/// unused-binding warnings at that point.
pub struct Scope {
    pub variables: HashMap<StringId, VariableBind>,
    pub mutabilities: HashMap<StringId, MutabilityBind>,
    pub types: HashMap<StringId, TypeBind>,
    pub parent_id: Option<ScopeId>,
    pub doc_id: DocumentId,
}

impl Scope {
    pub fn new(doc_id: DocumentId) -> Scope {
        Scope {
            variables: HashMap::new(),
            mutabilities: HashMap::new(),
            types: HashMap::new(),
            parent_id: None,
            doc_id,
        }
    }

    pub fn child_of(parent_id: ScopeId, doc_id: DocumentId) -> Scope {
        Scope {
            parent_id: Some(parent_id),
            ..Scope::new(doc_id)
        }
    }
}

/// Arenas necessary for the semantic analysis of one document.
#[derive(Default)]
pub struct DocumentArena {
    pub cst: cst::Arena,
    pub ast: ast::Arena,
    pub hir: hir::Arena,
    pub environments: Arena<EnvironmentId, Environment>,
    pub symbols: Arena<SymbolId, Symbol>,
    pub scopes: Arena<ScopeId, Scope>,
}

/// If a document is owned by a client, the editor's buffer is
/// authoritative and the server never reads the file from disk.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ownership {
    Server,
    Client,
}

/// An inlay type or parameter hint.
#[derive(Clone, Copy, Debug)]
pub struct InlayHint {
    pub position: Position,
    pub variant: InlayHintVariant,
}

#[derive(Clone, Copy, Debug)]
pub enum InlayHintVariant {
    /// Show the type of the binding introduced here.
    Type(hir::TypeId),
    /// Show the name of the parameter this argument binds to.
    Parameter(hir::PatternId),
}

/// A code action offered at a range.
#[derive(Clone, Copy, Debug)]
pub struct Action {
    pub variant: ActionVariant,
    pub range: Range,
}

#[derive(Clone, Copy, Debug)]
pub enum ActionVariant {
    /// Prefix the symbol's name with an underscore to silence an
    /// unused-symbol warning.
    SilenceUnused { symbol_id: SymbolId },
}

/// Signature help at a call site.
#[derive(Clone, Copy, Debug)]
pub struct SignatureInfo {
    pub function_id: hir::FunctionId,
    pub active_param: u32,
}

/// Environment completion mode: first segment of an implicit path
/// completes from the whole scope chain, later segments from the
/// environment the previous segment resolved to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompletionMode {
    Top,
    Path,
}

/// Code completion information for the current edit position.
#[derive(Clone, Debug)]
pub struct CompletionInfo {
    pub prefix: String,
    pub range: Range,
    pub env_id: EnvironmentId,
    pub mode: CompletionMode,
}

/// A recorded occurrence of a symbol, used to answer "what is at this
/// position" queries.
#[derive(Clone, Copy, Debug)]
pub struct SymbolReference {
    pub reference: Reference,
    pub symbol_id: SymbolId,
}

/// Information collected during analysis of one document.
#[derive(Default)]
pub struct DocumentInfo {
    pub diagnostics: Vec<Diagnostic>,
    pub semantic_tokens: Vec<SemanticToken>,
    pub inlay_hints: Vec<InlayHint>,
    pub references: Vec<SymbolReference>,
    pub actions: Vec<Action>,
    pub root_env_id: Option<EnvironmentId>,
    pub signature_info: Option<SignatureInfo>,
    pub completion_info: Option<CompletionInfo>,
}

/// An in-memory representation of a text document.
pub struct Document {
    pub info: DocumentInfo,
    pub text: String,
    pub arena: DocumentArena,
    pub ownership: Ownership,
    /// The cursor, when the client is editing this document; anchors
    /// completion and signature help collection.
    pub edit_position: Option<Position>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SemanticTokenMode {
    #[default]
    None,
    /// Only resolution-refined tokens.
    Partial,
    /// Lexical tokens from the parser as well.
    Full,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InlayHintMode {
    #[default]
    None,
    Type,
    Parameter,
    Full,
}

pub fn type_hints_enabled(mode: InlayHintMode) -> bool {
    matches!(mode, InlayHintMode::Type | InlayHintMode::Full)
}

pub fn parameter_hints_enabled(mode: InlayHintMode) -> bool {
    matches!(mode, InlayHintMode::Parameter | InlayHintMode::Full)
}

/// Compiler configuration.
#[derive(Clone, Debug)]
pub struct Configuration {
    pub main_name: String,
    pub extension: String,
    pub semantic_tokens: SemanticTokenMode,
    pub inlay_hints: InlayHintMode,
    pub references: bool,
    pub code_actions: bool,
    pub signature_help: bool,
    pub code_completion: bool,
    pub diagnostics: bool,
    /// Default unsolved integral inference variables to `I32` instead
    /// of reporting them.
    pub default_integer: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            main_name: "main".to_string(),
            extension: "ki".to_string(),
            semantic_tokens: SemanticTokenMode::None,
            inlay_hints: InlayHintMode::None,
            references: false,
            code_actions: false,
            signature_help: false,
            code_completion: false,
            diagnostics: true,
            default_integer: true,
        }
    }
}

impl Configuration {
    /// The configuration a language server runs with: every collector
    /// enabled.
    pub fn full() -> Configuration {
        Configuration {
            semantic_tokens: SemanticTokenMode::Full,
            inlay_hints: InlayHintMode::Full,
            references: true,
            code_actions: true,
            signature_help: true,
            code_completion: true,
            ..Configuration::default()
        }
    }
}

/// The compiler database: every document, the string pool, and the
/// active configuration.
pub struct Database {
    pub documents: Arena<DocumentId, Document>,
    pub paths: HashMap<PathBuf, DocumentId>,
    pub string_pool: StringPool,
    pub config: Configuration,
}

/// Represents a file read failure.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReadFailure {
    DoesNotExist,
    FailedToOpen,
    FailedToRead,
}

pub fn describe_read_failure(failure: ReadFailure) -> &'static str {
    match failure {
        ReadFailure::DoesNotExist => "File does not exist",
        ReadFailure::FailedToOpen => "Failed to open file",
        ReadFailure::FailedToRead => "Failed to read file",
    }
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(describe_read_failure(*self))
    }
}

impl std::error::Error for ReadFailure {}

/// Create a compiler database.
pub fn database(config: Configuration) -> Database {
    Database {
        documents: Arena::new(),
        paths: HashMap::new(),
        string_pool: StringPool::new(),
        config,
    }
}

/// Create a new document.
pub fn document(text: String, ownership: Ownership) -> Document {
    Document {
        info: DocumentInfo::default(),
        text,
        arena: DocumentArena::default(),
        ownership,
        edit_position: None,
    }
}

/// Map `path` to `document`, replacing any previous document at that
/// path.
pub fn set_document(db: &mut Database, path: PathBuf, document: Document) -> DocumentId {
    match db.paths.get(&path) {
        Some(&doc_id) if db.documents.get(doc_id).is_some() => {
            db.documents[doc_id] = document;
            doc_id
        }
        _ => {
            let doc_id = db.documents.push(document);
            db.paths.insert(path, doc_id);
            doc_id
        }
    }
}

/// Map `path` to a client-owned document with `text`.
pub fn client_open_document(db: &mut Database, path: PathBuf, text: String) -> DocumentId {
    set_document(db, path, document(text, Ownership::Client))
}

/// If the document identified by `doc_id` is owned by a client,
/// deallocate it.
pub fn client_close_document(db: &mut Database, doc_id: DocumentId) {
    let client_owned = db
        .documents
        .get(doc_id)
        .is_some_and(|doc| doc.ownership == Ownership::Client);
    if client_owned {
        db.documents.kill(doc_id);
        db.paths.retain(|_, &mut id| id != doc_id);
    }
}

/// Creates a temporary server-owned document with `text`.
pub fn test_document(db: &mut Database, text: String) -> DocumentId {
    let doc_id = db.documents.push(document(text, Ownership::Server));
    db.paths.insert(PathBuf::from(format!("[temporary-{}]", doc_id)), doc_id);
    doc_id
}

/// Find the path corresponding to the document identified by `doc_id`.
pub fn document_path(db: &Database, doc_id: DocumentId) -> Option<&Path> {
    db.paths
        .iter()
        .find_map(|(path, &id)| (id == doc_id).then_some(path.as_path()))
}

/// Attempt to read the file at `path`.
pub fn read_file(path: &Path) -> Result<String, ReadFailure> {
    if !path.exists() {
        return Err(ReadFailure::DoesNotExist);
    }
    let mut file = std::fs::File::open(path).map_err(|_| ReadFailure::FailedToOpen)?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|_| ReadFailure::FailedToRead)?;
    Ok(text)
}

/// Attempt to create a server-owned document by reading the file at
/// `path`.
pub fn read_document(db: &mut Database, path: PathBuf) -> Result<DocumentId, ReadFailure> {
    let text = read_file(&path)?;
    Ok(set_document(db, path, document(text, Ownership::Server)))
}

/// Describe the symbol kind for diagnostics and hover text.
pub fn describe_symbol_kind(variant: SymbolVariant) -> &'static str {
    match variant {
        SymbolVariant::Error => "an unresolvable symbol",
        SymbolVariant::Function(_) => "a function",
        SymbolVariant::Structure(_) => "a structure",
        SymbolVariant::Enumeration(_) => "an enumeration",
        SymbolVariant::Constructor(_) => "a constructor",
        SymbolVariant::Field(_) => "a field",
        SymbolVariant::Concept(_) => "a concept",
        SymbolVariant::Alias(_) => "a type alias",
        SymbolVariant::Module(_) => "a module",
        SymbolVariant::LocalVariable(_) => "a local variable binding",
        SymbolVariant::LocalMutability(_) => "a local mutability binding",
        SymbolVariant::LocalType(_) => "a local type binding",
    }
}

/// A range that does not lie within the text it was applied to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TextRangeError {
    pub range: Range,
}

impl fmt::Display for TextRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range {} is out of bounds", self.range)
    }
}

impl std::error::Error for TextRangeError {}

/// The byte offset of a character `position` within `text`, or `None`
/// when the position lies past the end of the text.
pub fn position_offset(text: &str, position: Position) -> Option<usize> {
    let mut current = Position::default();
    for (offset, character) in text.char_indices() {
        if current == position {
            return Some(offset);
        }
        if current > position {
            return None;
        }
        current = current.advance(character);
    }
    (current == position).then_some(text.len())
}

/// Find the substring of `text` corresponding to `range`.
pub fn text_range(text: &str, range: Range) -> Result<&str, TextRangeError> {
    let error = TextRangeError { range };
    let start = position_offset(text, range.start).ok_or(error)?;
    let stop = position_offset(text, range.stop).ok_or(error)?;
    if start > stop {
        return Err(error);
    }
    Ok(&text[start..stop])
}

/// Replace `range` in `text` with `new_text`.
pub fn edit_text(text: &mut String, range: Range, new_text: &str) -> Result<(), TextRangeError> {
    let error = TextRangeError { range };
    let start = position_offset(text, range.start).ok_or(error)?;
    let stop = position_offset(text, range.stop).ok_or(error)?;
    if start > stop {
        return Err(error);
    }
    text.replace_range(start..stop, new_text);
    Ok(())
}

/// Add `diagnostic` to the document identified by `doc_id`.
pub fn add_diagnostic(db: &mut Database, doc_id: DocumentId, diagnostic: Diagnostic) {
    if db.config.diagnostics {
        db.documents[doc_id].info.diagnostics.push(diagnostic);
    }
}

/// Add an error diagnostic to the document identified by `doc_id`.
pub fn add_error(db: &mut Database, doc_id: DocumentId, range: Range, message: String) {
    add_diagnostic(db, doc_id, lsp::error(range, message));
}

/// Add a semantic token to the document identified by `doc_id`.
pub fn add_semantic_token(
    db: &mut Database,
    doc_id: DocumentId,
    range: Range,
    kind: SemanticTokenType,
) {
    if db.config.semantic_tokens != SemanticTokenMode::None {
        db.documents[doc_id]
            .info
            .semantic_tokens
            .push(SemanticToken { range, kind });
    }
}

/// Add a type hint to the document identified by `doc_id`.
pub fn add_type_hint(db: &mut Database, doc_id: DocumentId, position: Position, type_id: hir::TypeId) {
    if type_hints_enabled(db.config.inlay_hints) {
        db.documents[doc_id].info.inlay_hints.push(InlayHint {
            position,
            variant: InlayHintVariant::Type(type_id),
        });
    }
}

/// Add a parameter hint to the document identified by `doc_id`.
pub fn add_param_hint(
    db: &mut Database,
    doc_id: DocumentId,
    position: Position,
    parameter: hir::PatternId,
) {
    if parameter_hints_enabled(db.config.inlay_hints) {
        db.documents[doc_id].info.inlay_hints.push(InlayHint {
            position,
            variant: InlayHintVariant::Parameter(parameter),
        });
    }
}

/// Add a code action to the document identified by `doc_id`.
pub fn add_action(db: &mut Database, doc_id: DocumentId, range: Range, variant: ActionVariant) {
    if db.config.code_actions {
        db.documents[doc_id].info.actions.push(Action { variant, range });
    }
}

/// Add a symbol reference to the document identified by `doc_id`.
pub fn add_reference(db: &mut Database, doc_id: DocumentId, reference: Reference, symbol_id: SymbolId) {
    if db.config.references {
        db.documents[doc_id]
            .info
            .references
            .push(SymbolReference { reference, symbol_id });
    }
}

/// Add signature help to the document identified by `doc_id` when the
/// edit position lies within `range`.
pub fn add_signature_help(
    db: &mut Database,
    doc_id: DocumentId,
    range: Range,
    function_id: hir::FunctionId,
    parameter_index: usize,
) {
    if db.config.signature_help {
        let document = &mut db.documents[doc_id];
        if document
            .edit_position
            .is_some_and(|position| range.contains(position))
        {
            document.info.signature_info = Some(SignatureInfo {
                function_id,
                active_param: parameter_index as u32,
            });
        }
    }
}

/// Add code completion information to the document identified by
/// `doc_id` when the edit position lies within `name`'s range.
pub fn add_completion(
    db: &mut Database,
    doc_id: DocumentId,
    name: Name,
    env_id: EnvironmentId,
    mode: CompletionMode,
) {
    if !db.config.code_completion {
        return;
    }
    let Some(edit_position) = db.documents[doc_id].edit_position else {
        return;
    };
    if !name.range.contains_inclusive(edit_position) {
        return;
    }
    let prefix_length = (edit_position.column - name.range.start.column) as usize;
    let prefix = db
        .string_pool
        .get(name.id)
        .chars()
        .take(prefix_length)
        .collect();
    db.documents[doc_id].info.completion_info = Some(CompletionInfo {
        prefix,
        range: Range::new(name.range.start, edit_position),
        env_id,
        mode,
    });
}

/// Get the range of the given symbol's defining name.
pub fn symbol_definition(arena: &DocumentArena, symbol_id: SymbolId) -> Range {
    arena.symbols[symbol_id].name.range
}

/// Get the primary type associated with the given symbol, if it has
/// one.
pub fn symbol_type(arena: &DocumentArena, symbol_id: SymbolId) -> Option<hir::TypeId> {
    match arena.symbols[symbol_id].variant {
        SymbolVariant::Function(id) => {
            let signature = arena.hir.functions[id].signature.resolved()?;
            Some(signature.function_type.id)
        }
        SymbolVariant::Structure(id) => Some(arena.hir.structures[id].type_id),
        SymbolVariant::Enumeration(id) => Some(arena.hir.enumerations[id].type_id),
        SymbolVariant::Constructor(id) => {
            let enumeration_id = arena.hir.constructors[id].enumeration_id;
            Some(arena.hir.enumerations[enumeration_id].type_id)
        }
        SymbolVariant::Field(id) => Some(arena.hir.fields[id].field_type.id),
        SymbolVariant::Alias(id) => Some(arena.hir.aliases[id].alias.resolved()?.aliased_type.id),
        SymbolVariant::LocalVariable(id) => Some(arena.hir.local_variables[id].type_id),
        SymbolVariant::LocalType(id) => Some(arena.hir.local_types[id].type_id),
        SymbolVariant::Error
        | SymbolVariant::Concept(_)
        | SymbolVariant::Module(_)
        | SymbolVariant::LocalMutability(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_text_replaces_range() {
        let mut text = "hello".to_string();
        let range = Range::new(Position::new(0, 5), Position::new(0, 6));
        // The stop position is out of bounds: "hello" has five columns.
        assert!(edit_text(&mut text, range, "").is_err());

        let mut text = "hello".to_string();
        let range = Range::new(Position::new(0, 4), Position::new(0, 5));
        edit_text(&mut text, range, "").unwrap();
        assert_eq!(text, "hell");
    }

    #[test]
    fn edit_text_inserts_at_position() {
        let mut text = "ab\ncd".to_string();
        let range = Range::for_position(Position::new(1, 1));
        edit_text(&mut text, range, "xyz").unwrap();
        assert_eq!(text, "ab\ncxyzd");
    }

    #[test]
    fn edit_text_across_lines() {
        let mut text = "one\ntwo\nthree".to_string();
        let range = Range::new(Position::new(0, 1), Position::new(2, 2));
        edit_text(&mut text, range, "").unwrap();
        assert_eq!(text, "oree");
    }

    #[test]
    fn text_range_extracts_substring() {
        let text = "let x = 5";
        let range = Range::new(Position::new(0, 4), Position::new(0, 5));
        assert_eq!(text_range(text, range).unwrap(), "x");
    }

    #[test]
    fn text_range_out_of_bounds_is_error() {
        let range = Range::new(Position::new(3, 0), Position::new(3, 1));
        assert!(text_range("short", range).is_err());
    }

    #[test]
    fn position_offset_counts_characters_not_bytes() {
        // 'ä' is two bytes but one character.
        let text = "ä x";
        assert_eq!(position_offset(text, Position::new(0, 2)), Some(3));
    }

    #[test]
    fn client_close_deallocates_client_document() {
        let mut db = database(Configuration::default());
        let doc_id = client_open_document(&mut db, PathBuf::from("/tmp/a.ki"), "fn".into());
        client_close_document(&mut db, doc_id);
        assert!(db.documents.get(doc_id).is_none());
        assert!(db.paths.is_empty());
    }

    #[test]
    fn client_close_keeps_server_document() {
        let mut db = database(Configuration::default());
        let doc_id = set_document(
            &mut db,
            PathBuf::from("/tmp/a.ki"),
            document("fn".into(), Ownership::Server),
        );
        client_close_document(&mut db, doc_id);
        assert!(db.documents.get(doc_id).is_some());
    }

    #[test]
    fn set_document_reuses_path_slot() {
        let mut db = database(Configuration::default());
        let first = client_open_document(&mut db, PathBuf::from("/tmp/a.ki"), "one".into());
        let second = client_open_document(&mut db, PathBuf::from("/tmp/a.ki"), "two".into());
        assert_eq!(first, second);
        assert_eq!(db.documents[second].text, "two");
    }

    #[test]
    fn collectors_are_gated_by_configuration() {
        let mut db = database(Configuration::default());
        let doc_id = test_document(&mut db, String::new());
        let range = Range::default();

        add_semantic_token(&mut db, doc_id, range, SemanticTokenType::Keyword);
        add_action(&mut db, doc_id, range, ActionVariant::SilenceUnused {
            symbol_id: SymbolId(0),
        });
        let info = &db.documents[doc_id].info;
        assert!(info.semantic_tokens.is_empty());
        assert!(info.actions.is_empty());

        db.config = Configuration::full();
        add_semantic_token(&mut db, doc_id, range, SemanticTokenType::Keyword);
        assert_eq!(db.documents[doc_id].info.semantic_tokens.len(), 1);
    }

    #[test]
    fn diagnostics_collected_by_default() {
        let mut db = database(Configuration::default());
        let doc_id = test_document(&mut db, String::new());
        add_error(&mut db, doc_id, Range::default(), "problem".into());
        assert_eq!(db.documents[doc_id].info.diagnostics.len(), 1);
    }

    #[test]
    fn symbol_definition_is_the_defining_name_range() {
        let mut db = database(Configuration::default());
        let doc_id = test_document(&mut db, "fn f".into());
        let name = Name {
            id: db.string_pool.intern("f"),
            range: Range::new(Position::new(0, 3), Position::new(0, 4)),
        };
        let symbol_id = db.documents[doc_id].arena.symbols.push(Symbol {
            variant: SymbolVariant::Error,
            name,
            use_count: 0,
        });
        assert_eq!(
            symbol_definition(&db.documents[doc_id].arena, symbol_id),
            name.range
        );
    }

    #[test]
    fn completion_requires_edit_position_inside_name() {
        let mut db = database(Configuration::full());
        let doc_id = test_document(&mut db, "vector".into());
        let name = Name {
            id: db.string_pool.intern("vector"),
            range: Range::new(Position::new(0, 0), Position::new(0, 6)),
        };
        let env_id = db.documents[doc_id]
            .arena
            .environments
            .push(Environment::root(doc_id));

        add_completion(&mut db, doc_id, name, env_id, CompletionMode::Top);
        assert!(db.documents[doc_id].info.completion_info.is_none());

        db.documents[doc_id].edit_position = Some(Position::new(0, 3));
        add_completion(&mut db, doc_id, name, env_id, CompletionMode::Top);
        let info = db.documents[doc_id].info.completion_info.clone().unwrap();
        assert_eq!(info.prefix, "vec");
        assert_eq!(info.mode, CompletionMode::Top);
    }
}
