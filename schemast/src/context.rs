//! Parsed schema package: loading, method lookup and printing.

use anyhow::{Context as _, Result as AnyResult, bail};
use log::{debug, trace};
use proc_macro2::Span;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::Visit;
use syn::{Ident, ImplItem, ImplItemFn, Item, Type};
use walkdir::WalkDir;

use crate::config::SchemastConfig;
use crate::errors::{Result, SchemastError};
use crate::field::return_value;
use crate::splice::{SourceEdit, byte_range, format_fields_list};

/// Default constructor namespace of field declarations.
pub const FIELD_NAMESPACE: &str = "field";

/// Default crate path of the schema runtime used in scaffolded files.
pub const DEFAULT_RUNTIME: &str = "ent";

/// A single parsed source unit of the schema package.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    unit: String,
    source: String,
    syntax: syn::File,
    edits: Vec<SourceEdit>,
    rewrite: bool,
    scaffolded: bool,
}

impl SchemaFile {
    /// Source unit name, relative to the schema directory (e.g. `user.rs`).
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn syntax(&self) -> &syn::File {
        &self.syntax
    }

    /// Whether this file was modified or created since loading.
    pub fn is_modified(&self) -> bool {
        self.scaffolded || self.rewrite || !self.edits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MethodPath {
    pub(crate) file: usize,
    item: usize,
    member: usize,
}

/// Editing context over a parsed schema package.
///
/// Owns every parsed file. Declaration edits resolve a type's methods here,
/// and scaffolded types are registered here until printed.
#[derive(Debug)]
pub struct Context {
    files: Vec<SchemaFile>,
    new_types: BTreeMap<String, usize>,
    pub(crate) namespace: Ident,
    pub(crate) runtime: String,
}

impl Context {
    /// Create an empty context with the default namespace and runtime.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            new_types: BTreeMap::new(),
            namespace: Ident::new(FIELD_NAMESPACE, Span::call_site()),
            runtime: DEFAULT_RUNTIME.to_string(),
        }
    }

    /// Build a context from in-memory `(unit name, source)` pairs.
    pub fn from_sources<I, U, S>(sources: I) -> AnyResult<Self>
    where
        I: IntoIterator<Item = (U, S)>,
        U: Into<String>,
        S: Into<String>,
    {
        let mut ctx = Self::new();
        for (unit, source) in sources {
            let unit = unit.into();
            let source = source.into();
            let syntax =
                syn::parse_file(&source).with_context(|| format!("Failed to parse {unit}"))?;
            ctx.push_file(unit, source, syntax, false);
        }
        Ok(ctx)
    }

    /// Load every `.rs` file below `dir`.
    pub fn load(dir: &Path) -> AnyResult<Self> {
        let mut ctx = Self::new();
        ctx.load_dir(dir)?;
        Ok(ctx)
    }

    /// Load the schema directory configured for the project at `root`.
    pub fn from_config(config: &SchemastConfig, root: &Path) -> AnyResult<Self> {
        let mut ctx = Self::new()
            .with_namespace(&config.schema.namespace)?
            .with_runtime(config.schema.runtime.clone());
        ctx.load_dir(&root.join(&config.schema.dir))?;
        Ok(ctx)
    }

    /// Use another constructor namespace than `field`.
    pub fn with_namespace(mut self, namespace: &str) -> AnyResult<Self> {
        self.namespace = syn::parse_str::<Ident>(namespace)
            .with_context(|| format!("Invalid constructor namespace {namespace:?}"))?;
        Ok(self)
    }

    /// Use another crate path in scaffolded imports than `ent`.
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn namespace(&self) -> &Ident {
        &self.namespace
    }

    pub fn files(&self) -> &[SchemaFile] {
        &self.files
    }

    /// Look up a source unit by name.
    pub fn file(&self, unit: &str) -> Option<&SchemaFile> {
        self.files.iter().find(|f| f.unit == unit)
    }

    /// Types scaffolded by [`Context::add_type`], with their source unit names.
    pub fn new_types(&self) -> impl Iterator<Item = (&str, &str)> {
        self.new_types
            .iter()
            .map(|(name, &idx)| (name.as_str(), self.files[idx].unit.as_str()))
    }

    /// Whether any file declares a struct, enum or impl block for `type_name`.
    pub fn declares_type(&self, type_name: &str) -> bool {
        self.files.iter().any(|f| declared_types(&f.syntax).contains(type_name))
    }

    /// Render every modified or scaffolded file without touching the disk.
    ///
    /// Edited files keep their original text outside the rewritten `fields()`
    /// lists. Scaffolded files are formatted with `prettyplease`.
    pub fn render(&self) -> Vec<(String, String)> {
        self.files
            .iter()
            .filter(|f| f.is_modified())
            .map(|f| (f.unit.clone(), self.render_file(f)))
            .collect()
    }

    /// Write every modified or scaffolded file below `dir`.
    ///
    /// Files whose rendered content matches what is on disk are skipped.
    /// Returns the paths that were written.
    pub fn print(&self, dir: &Path) -> AnyResult<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (unit, content) in self.render() {
            let path = dir.join(&unit);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }

            let should_write = match fs::read_to_string(&path) {
                Ok(existing) => existing != content,
                Err(_) => true,
            };
            if should_write {
                fs::write(&path, &content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                debug!("wrote schema file {}", path.display());
                written.push(path);
            }
        }
        Ok(written)
    }

    pub(crate) fn push_file(
        &mut self,
        unit: String,
        source: String,
        syntax: syn::File,
        scaffolded: bool,
    ) -> usize {
        self.files.push(SchemaFile {
            unit,
            source,
            syntax,
            edits: Vec::new(),
            rewrite: false,
            scaffolded,
        });
        self.files.len() - 1
    }

    pub(crate) fn register_new_type(&mut self, type_name: &str, file: usize) {
        self.new_types.insert(type_name.to_string(), file);
    }

    pub(crate) fn is_new_type(&self, type_name: &str) -> bool {
        self.new_types.contains_key(type_name)
    }

    /// Remember that the return value of `path` was replaced. `original` is
    /// the span of the value before its first replacement.
    pub(crate) fn record_edit(&mut self, type_name: &str, path: MethodPath, original: Span) {
        let Some(file) = self.files.get_mut(path.file) else { return };
        if file.scaffolded || file.rewrite || file.edits.iter().any(|e| e.path == path) {
            return;
        }
        match byte_range(&file.source, original) {
            Some(range) => file.edits.push(SourceEdit {
                type_name: type_name.to_string(),
                path,
                range,
            }),
            None => {
                debug!("no source location for {type_name}, {} will be reformatted", file.unit);
                file.rewrite = true;
            }
        }
    }

    /// Find the method named `method` in an impl block of `type_name`.
    pub(crate) fn locate_method(&self, type_name: &str, method: &str) -> Result<MethodPath> {
        for (file_idx, file) in self.files.iter().enumerate() {
            for (item_idx, item) in file.syntax.items.iter().enumerate() {
                let Item::Impl(item_impl) = item else { continue };
                if !is_impl_for(&item_impl.self_ty, type_name) {
                    continue;
                }
                for (member_idx, member) in item_impl.items.iter().enumerate() {
                    if let ImplItem::Fn(func) = member
                        && func.sig.ident == method
                    {
                        trace!("resolved {type_name}::{method} in {}", file.unit);
                        return Ok(MethodPath {
                            file: file_idx,
                            item: item_idx,
                            member: member_idx,
                        });
                    }
                }
            }
        }

        if self.declares_type(type_name) {
            Err(SchemastError::MethodNotFound {
                type_name: type_name.to_string(),
                method: method.to_string(),
            })
        } else {
            Err(SchemastError::TypeNotFound {
                type_name: type_name.to_string(),
            })
        }
    }

    pub(crate) fn method(&self, path: MethodPath) -> Option<&ImplItemFn> {
        let file = self.files.get(path.file)?;
        let Item::Impl(item_impl) = file.syntax.items.get(path.item)? else {
            return None;
        };
        match item_impl.items.get(path.member)? {
            ImplItem::Fn(func) => Some(func),
            _ => None,
        }
    }

    pub(crate) fn method_mut(&mut self, path: MethodPath) -> Option<&mut ImplItemFn> {
        let file = self.files.get_mut(path.file)?;
        let Item::Impl(item_impl) = file.syntax.items.get_mut(path.item)? else {
            return None;
        };
        match item_impl.items.get_mut(path.member)? {
            ImplItem::Fn(func) => Some(func),
            _ => None,
        }
    }

    fn render_file(&self, file: &SchemaFile) -> String {
        if file.scaffolded || file.rewrite {
            return prettyplease::unparse(&file.syntax);
        }
        match self.splice_edits(file) {
            Some(text) => text,
            None => {
                debug!("reformatting {} after an unlocatable edit", file.unit);
                prettyplease::unparse(&file.syntax)
            }
        }
    }

    /// Original source of `file` with each edited return value replaced.
    fn splice_edits(&self, file: &SchemaFile) -> Option<String> {
        let mut edits: Vec<&SourceEdit> = file.edits.iter().collect();
        edits.sort_by_key(|e| Reverse(e.range.start));

        let mut text = file.source.clone();
        for edit in edits {
            let func = self.method(edit.path)?;
            let returned = return_value(&edit.type_name, func).ok()?;
            let replacement = format_fields_list(&file.source, edit.range.clone(), returned)?;
            text.replace_range(edit.range.clone(), &replacement);
        }
        Some(text)
    }

    fn load_dir(&mut self, dir: &Path) -> AnyResult<()> {
        if !dir.is_dir() {
            bail!("Schema directory {} does not exist", dir.display());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(dir) {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            let path = entry.into_path();
            if path.extension().is_some_and(|ext| ext == "rs") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let syntax = syn::parse_file(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let unit = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            trace!("loaded schema file {unit}");
            self.push_file(unit, content, syntax, false);
        }

        debug!("loaded {} schema files from {}", self.files.len(), dir.display());
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `ty` names `type_name` (e.g. `User` or `crate::schema::User`).
fn is_impl_for(ty: &Type, type_name: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == type_name),
        _ => false,
    }
}

/// Collect the names of every struct, enum and impl target in a file.
pub(crate) fn declared_types(file: &syn::File) -> BTreeSet<String> {
    let mut collector = TypeCollector::default();
    collector.visit_file(file);
    collector.names
}

#[derive(Default)]
struct TypeCollector {
    names: BTreeSet<String>,
}

impl<'ast> Visit<'ast> for TypeCollector {
    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        self.names.insert(node.ident.to_string());
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.names.insert(node.ident.to_string());
    }

    fn visit_item_impl(&mut self, node: &'ast syn::ItemImpl) {
        if let Type::Path(type_path) = &*node.self_ty
            && let Some(seg) = type_path.path.segments.last()
        {
            self.names.insert(seg.ident.to_string());
        }
        syn::visit::visit_item_impl(self, node);
    }
}
