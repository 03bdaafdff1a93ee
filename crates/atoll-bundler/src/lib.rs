//! # atoll-bundler
//!
//! Dual-target build of an atoll source tree.
//!
//! One [`BuildContext::build`] runs:
//!
//! 1. a **server pass** compiling every module under the source root into
//!    `server/`, tree preserved;
//! 2. **island collection**, writing one client entry stub per island into
//!    `.generated/`;
//! 3. a **browser pass** bundling each stub, with everything it imports, into
//!    one script in `.client/`, the [`HydrationInjector`] turning each island
//!    module into a self-mounting one on the way.
//!
//! All three write into a per-generation staging directory which
//! [`BuildContext::commit`] swaps into `<out>` once the build succeeded.
//!
//! Compilers sit behind the [`Compiler`] trait; the default [`Toolchain`]
//! pairs the [`OxcCompiler`] transpiler (server) with the rolldown-backed
//! [`RolldownCompiler`] (browser).

pub mod compiler;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod hydration;
pub mod island;

pub use compiler::{
    CompileOutput, CompileRequest, Compiler, EmittedModule, LoadHook, OxcCompiler,
    RolldownCompiler, Target, apply_hooks,
};
pub use context::{BuildContext, BuildOptions, BuildReport, OutputLayout, TargetContext, Toolchain};
pub use diagnostics::{CompileFailure, Diagnostic, DiagnosticKind, DiagnosticSeverity};
pub use error::{BuildError, Result};
pub use hydration::HydrationInjector;
pub use island::{IslandCollector, IslandEntry, client_entry_name, is_island, island_id};
