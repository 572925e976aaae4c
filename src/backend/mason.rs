//! MASON backend: emits a Java agent class per declared agent, mirroring
//! MASON's `Steppable`-per-agent object model rather than FLAME's
//! message-passing state machine.

use super::{write_asset, Backend, Context};

pub struct MasonBackend;

impl Backend for MasonBackend {
    fn name(&self) -> &'static str {
        "mason"
    }

    fn check_compatible(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()> {
        for agent in &ctx.script.agents {
            let mut java = String::new();
            java.push_str(&format!("public class {} implements sim.engine.Steppable {{\n", agent.name));
            for member in &agent.members {
                java.push_str(&format!("    /* {} : {} */\n", member.name, member.resolved_type));
            }
            java.push_str("    public void step(sim.engine.SimState state) {\n    }\n");
            java.push_str("}\n");
            write_asset(&ctx.config.asset_dir, &format!("{}.java", agent.name), &java)?;
        }
        Ok(())
    }
}
