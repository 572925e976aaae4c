//! FlameGPU backend: the most constrained target, since CUDA kernels
//! can't allocate new agents mid-step the way the host-side backends can
//! (spec.md §4.2, the `uses_agent_creation_in_step` flag exists for
//! exactly this check).

use super::{write_asset, Backend, Context};

pub struct FlameGpuBackend;

impl Backend for FlameGpuBackend {
    fn name(&self) -> &'static str {
        "flamegpu"
    }

    fn check_compatible(&self, ctx: &Context<'_>) -> Option<String> {
        if ctx.script.uses_agent_creation_in_step {
            return Some(
                "flamegpu cannot target a model that creates agents from within a step function"
                    .to_string(),
            );
        }
        None
    }

    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()> {
        let mut xml = String::new();
        xml.push_str("<gpu:xmodel xmlns:gpu=\"https://www.flamegpu.com\">\n");
        for flame_agent in &ctx.model.agents {
            let name = &ctx.script.agent(flame_agent.agent).name;
            xml.push_str(&format!("  <gpu:xagent>\n    <name>{name}</name>\n  </gpu:xagent>\n"));
        }
        xml.push_str("</gpu:xmodel>\n");
        write_asset(&ctx.config.asset_dir, "XMLModelFile.xml", &xml)
    }
}
