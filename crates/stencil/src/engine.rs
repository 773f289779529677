//! The render engine.
//!
//! [`Engine`] owns the compiler, the template/cache directories, the filter
//! registry, globals, and the root layout setting. All per-render state
//! (layout stack, outlets, slots, skip-root flag) lives in a [`RenderState`]
//! value created fresh for each top-level [`Engine::render`] call and
//! threaded explicitly through the layout chain; nothing render-scoped is
//! stored on the engine itself.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use stencil_compiler::{CompileError, Compiler, Node, Program};
use tracing::debug;

use crate::cache::ProgramCache;
use crate::error::RenderError;
use crate::escape::{escape, EscapeContext};
use crate::filters::FilterRegistry;
use crate::loader::TemplateLoader;

/// Caller-supplied outlet overrides for a render call.
pub type Outlets = HashMap<String, Outlet>;

/// Content for a named outlet: either a literal string emitted verbatim, or
/// a deferred template rendered when the outlet is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Outlet {
    Content(String),
    Template { template: String, data: Value },
}

/// Per-render state, created fresh for each top-level render.
///
/// The layout chain of one render shares a single state, which is what makes
/// slots captured in a child visible to the layouts that wrap it. Nested
/// renders for includes and deferred outlets get a fresh state of their own.
pub(crate) struct RenderState {
    pub layouts: Vec<String>,
    pub outlets: Outlets,
    pub slots: HashMap<String, String>,
    pub skip_root: bool,
}

/// A template rendering engine bound to a template directory and a cache
/// directory.
///
/// Rendering is synchronous and strictly sequential per engine. The one-shot
/// skip-root flag is a [`Cell`], which makes `Engine` `!Sync`; callers that
/// want concurrent rendering use one engine per thread.
pub struct Engine {
    compiler: Compiler,
    loader: TemplateLoader,
    cache: ProgramCache,
    root_layout: Option<String>,
    skip_root_once: Cell<bool>,
    globals: Map<String, Value>,
    pub(crate) filters: FilterRegistry,
}

impl Engine {
    /// Creates an engine, creating the cache directory if needed.
    pub fn new(
        template_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, RenderError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            compiler: Compiler::new(),
            loader: TemplateLoader::new(template_dir.into()),
            cache: ProgramCache::new(cache_dir, true),
            root_layout: None,
            skip_root_once: Cell::new(false),
            globals: Map::new(),
            filters: FilterRegistry::with_builtins(),
        })
    }

    /// Debug mode disables the compilation cache: every render recompiles
    /// from source.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.cache.set_enabled(!debug);
        self
    }

    /// Sets the template every top-level render is wrapped in after its own
    /// layout chain is exhausted.
    pub fn set_root_layout(&mut self, template: &str) {
        self.root_layout = Some(template.to_string());
    }

    /// Skips the root layout for the next top-level render only.
    pub fn skip_root_layout(&self) {
        self.skip_root_once.set(true);
    }

    /// Registers a filter, replacing any existing registration under the
    /// same name.
    pub fn add_filter<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value, RenderError> + Send + Sync + 'static,
    {
        self.filters.add(name, filter);
    }

    /// Registers a custom directive on the underlying compiler, replacing
    /// any existing registration under the same name.
    pub fn add_directive<F>(&mut self, name: &str, compiler: F)
    where
        F: Fn(&str) -> Result<Node, CompileError> + Send + Sync + 'static,
    {
        self.compiler.add_directive(name, compiler);
    }

    /// Makes a value available in every render's scope unless shadowed by a
    /// caller-supplied key.
    pub fn add_global(&mut self, name: &str, value: impl Into<Value>) {
        self.globals.insert(name.to_string(), value.into());
    }

    /// Escapes a value for an output context.
    pub fn escape(&self, value: &Value, context: EscapeContext) -> String {
        escape(value, context)
    }

    /// Applies a registered filter by name.
    pub fn apply_filter(
        &self,
        name: &str,
        value: &Value,
        args: &[Value],
    ) -> Result<Value, RenderError> {
        self.filters.apply(name, value, args)
    }

    /// Renders a template by logical name against `data`, with
    /// caller-supplied outlet content.
    ///
    /// `data` must serialize to an object (or null for no data); its keys
    /// shadow registered globals.
    pub fn render<T: Serialize>(
        &self,
        template: &str,
        data: &T,
        outlets: Outlets,
    ) -> Result<String, RenderError> {
        let data = into_object(serde_json::to_value(data)?)?;
        let mut state = RenderState {
            layouts: Vec::new(),
            outlets,
            slots: HashMap::new(),
            skip_root: self.skip_root_once.take(),
        };

        let mut output = self.render_chain(template, &data, &mut state)?;

        if let Some(root) = &self.root_layout {
            if !state.skip_root {
                state
                    .outlets
                    .insert("default".to_string(), Outlet::Content(output));
                output = self.render_chain(root, &data, &mut state)?;
            }
        }

        Ok(output)
    }

    /// Non-root render used for includes and deferred outlets: fresh state,
    /// no root layout.
    pub(crate) fn render_nested(
        &self,
        template: &str,
        data: &Map<String, Value>,
        outlets: Outlets,
    ) -> Result<String, RenderError> {
        let mut state = RenderState {
            layouts: Vec::new(),
            outlets,
            slots: HashMap::new(),
            skip_root: false,
        };
        self.render_chain(template, data, &mut state)
    }

    /// Renders a template and consumes the layouts it pushes, innermost
    /// first. Each layout's render may push further layouts, continuing the
    /// chain.
    fn render_chain(
        &self,
        template: &str,
        data: &Map<String, Value>,
        state: &mut RenderState,
    ) -> Result<String, RenderError> {
        let mut output = self.render_template(template, data, state)?;
        while let Some(layout) = state.layouts.pop() {
            state
                .outlets
                .insert("default".to_string(), Outlet::Content(output));
            output = self.render_template(&layout, data, state)?;
        }
        Ok(output)
    }

    fn render_template(
        &self,
        template: &str,
        data: &Map<String, Value>,
        state: &mut RenderState,
    ) -> Result<String, RenderError> {
        let program = self.program(template)?;
        let mut scope = self.globals.clone();
        scope.extend(data.clone());
        let mut output = String::new();
        self.exec(&program.nodes, &mut scope, state, &mut output)?;
        Ok(output)
    }

    /// Resolves a template to its compiled program, reusing the cached
    /// artifact when it is current.
    fn program(&self, template: &str) -> Result<Program, RenderError> {
        let path = self.loader.resolve(template);
        let mtime = self
            .loader
            .mtime(&path)
            .ok_or_else(|| RenderError::TemplateNotFound(template.to_string()))?;

        if let Some(program) = self.cache.load(&path, mtime) {
            return Ok(program);
        }

        debug!(template, "compiling template");
        let source = self.loader.read(&path)?;
        let program = self.compiler.compile(&source)?;
        self.cache.store(&path, &program)?;
        Ok(program)
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, RenderError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(RenderError::Serialization(
            "template data must serialize to an object".to_string(),
        )),
    }
}
