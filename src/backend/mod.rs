//! Backend interface (spec.md §1, §4.2: "the backend interface ... is an
//! external collaborator's concern").
//!
//! `Backend` is intentionally thin: given an analyzed [`Script`] and its
//! derived [`FlameModel`], a backend checks whether the script uses any
//! feature it cannot express and, if compatible, emits whatever asset
//! files its target runtime needs. Concrete backends here are minimal
//! reference implementations — enough to exercise the interface and the
//! CLI's `-b` dispatch, not full code generators for six different
//! simulation runtimes.

mod c;
mod dmason;
mod flame_cpu;
mod flamegpu;
mod mason;
mod mason2;

use crate::ast::Script;
use crate::flame::FlameModel;
use std::collections::HashMap;
use std::path::Path;

pub use c::CBackend;
pub use dmason::DMasonBackend;
pub use flame_cpu::FlameCpuBackend;
pub use flamegpu::FlameGpuBackend;
pub use mason::MasonBackend;
pub use mason2::Mason2Backend;

/// Resolved `-C key=value` configuration handed to a backend, and the
/// `-A` asset directory it should write generated files under
/// (spec.md §5).
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub values: HashMap<String, String>,
    pub asset_dir: std::path::PathBuf,
}

impl Config {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Everything a backend needs to emit its output.
pub struct Context<'a> {
    pub script: &'a Script,
    pub model: &'a FlameModel,
    pub config: &'a Config,
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Return a human-readable reason the script can't target this
    /// backend, or `None` if it's compatible. Checked before `emit`.
    fn check_compatible(&self, ctx: &Context<'_>) -> Option<String>;

    /// Write whatever asset files this backend's runtime needs under
    /// `ctx.config.asset_dir`.
    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()>;
}

pub fn by_name(name: &str) -> Option<Box<dyn Backend>> {
    match name {
        "c" => Some(Box::new(CBackend)),
        "flamecpu" => Some(Box::new(FlameCpuBackend)),
        "flamegpu" => Some(Box::new(FlameGpuBackend)),
        "mason" => Some(Box::new(MasonBackend)),
        "mason2" => Some(Box::new(Mason2Backend)),
        "dmason" => Some(Box::new(DMasonBackend)),
        _ => None,
    }
}

pub const BACKEND_NAMES: &[&str] = &["c", "flamecpu", "flamegpu", "mason", "mason2", "dmason"];

pub(crate) fn write_asset(dir: &Path, file_name: &str, contents: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(file_name), contents)
}
