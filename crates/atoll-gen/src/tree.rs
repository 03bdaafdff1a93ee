//! Mutable syntax tree for a single JavaScript module
//!
//! [`SyntaxTree`] is the only AST surface the rest of atoll sees: parse a
//! module, splice statements in front of or behind its body, look up the
//! default export, rewrite import specifiers, lower JSX/TypeScript and print
//! the result back to source.

use crate::error::{GenError, Result};
use crate::parser::ParseOptions;
use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use oxc_ast::ast::{ExportDefaultDeclarationKind, Program, Statement, StringLiteral};
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::{Atom, GetSpanMut, SPAN, SourceType};
use oxc_transformer::{TransformOptions, Transformer};
use std::path::{Path, PathBuf};

/// How a module exposes its default export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultExport {
    /// `export default function Name() {}`, `export default class Name {}`,
    /// `export default Name` or `export { Name as default }`
    Named(String),
    /// `export default function () {}` / `export default class {}`
    Anonymous,
    /// `export default <expression>`
    Expression,
}

/// Where an import/export specifier appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    Import,
    ExportAll,
    ExportNamed,
}

/// A static module specifier found at the top level of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpecifier {
    pub kind: SpecifierKind,
    pub value: String,
}

impl ModuleSpecifier {
    /// Relative specifiers (`./x`, `../x`) naming a file of this project
    pub fn is_local(&self) -> bool {
        self.value.starts_with("./") || self.value.starts_with("../")
    }

    /// Package specifiers such as `preact` or `preact/hooks`
    pub fn is_bare(&self) -> bool {
        !self.is_local() && !self.value.starts_with('/') && !self.value.contains("://")
    }
}

/// A parsed module whose nodes live in a caller-provided arena.
pub struct SyntaxTree<'a> {
    allocator: &'a Allocator,
    program: Program<'a>,
    source_type: SourceType,
    path: PathBuf,
}

impl<'a> SyntaxTree<'a> {
    /// Parse `source` as the module at `path`, inferring the dialect from
    /// its extension.
    pub fn parse(allocator: &'a Allocator, source: &'a str, path: &Path) -> Result<Self> {
        let options = ParseOptions::from_path(path)?;
        Self::parse_with(allocator, source, path, options)
    }

    /// Parse with explicit options
    pub fn parse_with(
        allocator: &'a Allocator,
        source: &'a str,
        path: &Path,
        options: ParseOptions,
    ) -> Result<Self> {
        let ret = Parser::new(allocator, source, options.source_type).parse();

        if ret.panicked || !ret.errors.is_empty() {
            return Err(GenError::parse_failed(
                path.display().to_string(),
                ret.errors.iter().map(|e| e.to_string()).collect(),
            ));
        }

        Ok(Self {
            allocator,
            program: ret.program,
            source_type: options.source_type,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn allocator(&self) -> &'a Allocator {
        self.allocator
    }

    pub fn program(&self) -> &Program<'a> {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program<'a> {
        &mut self.program
    }

    /// Number of top-level statements
    pub fn len(&self) -> usize {
        self.program.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.body.is_empty()
    }

    /// Parse `snippet` in this module's dialect and return its statements.
    ///
    /// Snippet spans are reset so they never collide with comment anchors of
    /// the host module when printing.
    fn parse_snippet(&self, snippet: &str) -> Result<Vec<Statement<'a>>> {
        let text: &'a str = self.allocator.alloc_str(snippet);
        let ret = Parser::new(self.allocator, text, self.source_type).parse();

        if ret.panicked || !ret.errors.is_empty() {
            let reason = ret
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GenError::invalid_snippet(reason));
        }

        Ok(ret
            .program
            .body
            .into_iter()
            .map(|mut stmt| {
                *stmt.span_mut() = SPAN;
                stmt
            })
            .collect())
    }

    /// Insert the statements of `snippet` before the existing body.
    pub fn prepend_source(&mut self, snippet: &str) -> Result<()> {
        let injected = self.parse_snippet(snippet)?;
        let ast = AstBuilder::new(self.allocator);
        let old = std::mem::replace(&mut self.program.body, ast.vec());
        self.program.body = ast.vec_from_iter(injected.into_iter().chain(old));
        Ok(())
    }

    /// Append the statements of `snippet` after the existing body.
    pub fn append_source(&mut self, snippet: &str) -> Result<()> {
        for stmt in self.parse_snippet(snippet)? {
            self.program.body.push(stmt);
        }
        Ok(())
    }

    /// Classify the module's default export, if it has one.
    pub fn default_export(&self) -> Option<DefaultExport> {
        for stmt in &self.program.body {
            match stmt {
                Statement::ExportDefaultDeclaration(decl) => {
                    return Some(match &decl.declaration {
                        ExportDefaultDeclarationKind::FunctionDeclaration(func) => func
                            .id
                            .as_ref()
                            .map_or(DefaultExport::Anonymous, |id| {
                                DefaultExport::Named(id.name.to_string())
                            }),
                        ExportDefaultDeclarationKind::ClassDeclaration(class) => class
                            .id
                            .as_ref()
                            .map_or(DefaultExport::Anonymous, |id| {
                                DefaultExport::Named(id.name.to_string())
                            }),
                        ExportDefaultDeclarationKind::Identifier(ident) => {
                            DefaultExport::Named(ident.name.to_string())
                        }
                        _ => DefaultExport::Expression,
                    });
                }
                Statement::ExportNamedDeclaration(named) if named.source.is_none() => {
                    if let Some(spec) = named
                        .specifiers
                        .iter()
                        .find(|spec| spec.exported.name().as_str() == "default")
                    {
                        return Some(DefaultExport::Named(spec.local.name().to_string()));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Local binding name of the default export, if it has one.
    pub fn default_export_name(&self) -> Option<String> {
        match self.default_export()? {
            DefaultExport::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Give an anonymous default-exported function or class the binding
    /// `name`, returning the binding the default export is reachable by.
    ///
    /// Returns `None` when there is no default export or it is an arbitrary
    /// expression without a binding.
    pub fn ensure_default_export_name(&mut self, name: &str) -> Option<String> {
        match self.default_export()? {
            DefaultExport::Named(existing) => return Some(existing),
            DefaultExport::Expression => return None,
            DefaultExport::Anonymous => {}
        }

        let ast = AstBuilder::new(self.allocator);
        let atom: &'a str = self.allocator.alloc_str(name);

        for stmt in self.program.body.iter_mut() {
            if let Statement::ExportDefaultDeclaration(decl) = stmt {
                match &mut decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        func.id = Some(ast.binding_identifier(SPAN, atom));
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        class.id = Some(ast.binding_identifier(SPAN, atom));
                    }
                    _ => return None,
                }
                return Some(name.to_string());
            }
        }
        None
    }

    fn specifier_slots(&mut self) -> Vec<(SpecifierKind, &mut StringLiteral<'a>)> {
        let mut slots = Vec::new();
        for stmt in self.program.body.iter_mut() {
            match stmt {
                Statement::ImportDeclaration(import) => {
                    slots.push((SpecifierKind::Import, &mut import.source));
                }
                Statement::ExportAllDeclaration(all) => {
                    slots.push((SpecifierKind::ExportAll, &mut all.source));
                }
                Statement::ExportNamedDeclaration(named) => {
                    if let Some(source) = named.source.as_mut() {
                        slots.push((SpecifierKind::ExportNamed, source));
                    }
                }
                _ => {}
            }
        }
        slots
    }

    /// Static specifiers of `import`, `export *` and `export { } from`
    /// statements, in source order.
    pub fn module_specifiers(&self) -> Vec<ModuleSpecifier> {
        let mut found = Vec::new();
        for stmt in &self.program.body {
            let (kind, value) = match stmt {
                Statement::ImportDeclaration(import) => {
                    (SpecifierKind::Import, import.source.value.as_str())
                }
                Statement::ExportAllDeclaration(all) => {
                    (SpecifierKind::ExportAll, all.source.value.as_str())
                }
                Statement::ExportNamedDeclaration(named) => match &named.source {
                    Some(source) => (SpecifierKind::ExportNamed, source.value.as_str()),
                    None => continue,
                },
                _ => continue,
            };
            found.push(ModuleSpecifier {
                kind,
                value: value.to_string(),
            });
        }
        found
    }

    /// Replace every static specifier for which `rewrite` returns a new
    /// value. Returns how many specifiers changed.
    pub fn rewrite_specifiers<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(&ModuleSpecifier) -> Option<String>,
    {
        let allocator = self.allocator;
        let mut changed = 0;
        for (kind, literal) in self.specifier_slots() {
            let current = ModuleSpecifier {
                kind,
                value: literal.value.to_string(),
            };
            if let Some(next) = rewrite(&current) {
                if next != current.value {
                    literal.value = Atom::from(allocator.alloc_str(&next));
                    literal.raw = None;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Lower JSX and strip TypeScript so the module runs as plain ESM.
    ///
    /// The JSX automatic runtime honors a `@jsxImportSource` pragma comment
    /// in the module.
    pub fn transpile(&mut self) -> Result<()> {
        let scoping = SemanticBuilder::new()
            .build(&self.program)
            .semantic
            .into_scoping();

        let ret = Transformer::new(self.allocator, &self.path, &TransformOptions::default())
            .build_with_scoping(scoping, &mut self.program);

        if !ret.errors.is_empty() {
            return Err(GenError::TransformFailed {
                path: self.path.display().to_string(),
                messages: ret.errors.iter().map(|e| e.to_string()).collect(),
            });
        }
        Ok(())
    }

    /// Print the tree back to JavaScript source.
    pub fn print(&self) -> String {
        Codegen::new().build(&self.program).code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_tree<R>(source: &str, path: &str, f: impl FnOnce(&mut SyntaxTree<'_>) -> R) -> R {
        let allocator = Allocator::default();
        let source = allocator.alloc_str(source);
        let mut tree = SyntaxTree::parse(&allocator, source, Path::new(path)).unwrap();
        f(&mut tree)
    }

    #[test]
    fn prepend_and_append_keep_original_body_in_between() {
        let printed = with_tree(
            "export default function Counter() { return 1; }\n",
            "counter.island.js",
            |tree| {
                tree.prepend_source("import { h } from \"preact\";").unwrap();
                tree.append_source("console.log(\"mounted\");").unwrap();
                assert_eq!(tree.len(), 3);
                tree.print()
            },
        );

        let import = printed.find("import { h } from \"preact\"").unwrap();
        let counter = printed.find("function Counter").unwrap();
        let mounted = printed.find("console.log(\"mounted\")").unwrap();
        assert!(import < counter && counter < mounted, "{printed}");
    }

    #[test]
    fn invalid_snippet_is_rejected() {
        with_tree("export const a = 1;", "a.js", |tree| {
            let err = tree.prepend_source("import {").unwrap_err();
            assert!(matches!(err, GenError::InvalidSnippet { .. }));
            assert_eq!(tree.len(), 1);
        });
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let allocator = Allocator::default();
        let err = SyntaxTree::parse(&allocator, "let = ;", Path::new("pages/broken.js"))
            .err()
            .unwrap();
        match err {
            GenError::ParseFailed { path, messages } => {
                assert_eq!(path, "pages/broken.js");
                assert!(!messages.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_export_forms() {
        let cases = [
            ("export default function Counter() {}", Some(DefaultExport::Named("Counter".into()))),
            ("export default class Widget {}", Some(DefaultExport::Named("Widget".into()))),
            ("const A = 1; export default A;", Some(DefaultExport::Named("A".into()))),
            ("const B = 1; export { B as default };", Some(DefaultExport::Named("B".into()))),
            ("export default function () {}", Some(DefaultExport::Anonymous)),
            ("export default () => null;", Some(DefaultExport::Expression)),
            ("export const x = 1;", None),
        ];
        for (source, expected) in cases {
            let found = with_tree(source, "m.js", |tree| tree.default_export());
            assert_eq!(found, expected, "{source}");
        }
    }

    #[test]
    fn anonymous_default_export_gets_a_binding() {
        let printed = with_tree("export default function () { return 1; }", "m.js", |tree| {
            assert_eq!(
                tree.ensure_default_export_name("__island"),
                Some("__island".to_string())
            );
            assert_eq!(tree.default_export_name(), Some("__island".to_string()));
            tree.print()
        });
        assert!(printed.contains("function __island()"), "{printed}");
    }

    #[test]
    fn rewrite_specifiers_touches_only_matching_sources() {
        let source = r#"
import { h } from "preact";
import Counter from "./counter.island.jsx";
export * from "../lib/util.ts";
export { helper } from "./helper";
export const local = 1;
"#;
        let printed = with_tree(source, "pages/index.jsx", |tree| {
            let specifiers = tree.module_specifiers();
            assert_eq!(specifiers.len(), 4);
            assert_eq!(specifiers[1].kind, SpecifierKind::Import);
            assert!(!specifiers[0].is_local());
            assert!(specifiers[2].is_local());

            let changed = tree.rewrite_specifiers(|spec| {
                spec.is_local().then(|| format!("{}.js", spec.value))
            });
            assert_eq!(changed, 3);
            tree.print()
        });

        assert!(printed.contains("\"preact\""), "{printed}");
        assert!(printed.contains("\"./counter.island.jsx.js\""), "{printed}");
        assert!(printed.contains("\"../lib/util.ts.js\""), "{printed}");
        assert!(printed.contains("\"./helper.js\""), "{printed}");
    }

    #[test]
    fn transpile_lowers_jsx_with_pragma_import_source() {
        let source = "/** @jsxImportSource preact */\nexport default function Page() { return <h1>Hello</h1>; }\n";
        let printed = with_tree(source, "pages/index.jsx", |tree| {
            tree.transpile().unwrap();
            tree.print()
        });
        assert!(printed.contains("preact/jsx-runtime"), "{printed}");
        assert!(!printed.contains("<h1>"), "{printed}");
    }

    #[test]
    fn transpile_strips_types() {
        let printed = with_tree(
            "export function add(a: number, b: number): number { return a + b; }",
            "lib/add.ts",
            |tree| {
                tree.transpile().unwrap();
                tree.print()
            },
        );
        assert!(printed.contains("function add(a, b)"), "{printed}");
    }
}
