//! DMason backend: MASON's distributed sibling. Requires every agent to
//! declare a position member, since DMason partitions the simulated
//! space across worker nodes by agent location.

use super::{write_asset, Backend, Context};

pub struct DMasonBackend;

impl Backend for DMasonBackend {
    fn name(&self) -> &'static str {
        "dmason"
    }

    fn check_compatible(&self, ctx: &Context<'_>) -> Option<String> {
        for agent in &ctx.script.agents {
            if !agent.members.iter().any(|m| m.is_position) {
                return Some(format!(
                    "dmason requires every agent to have a position member, but '{}' has none",
                    agent.name
                ));
            }
        }
        None
    }

    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()> {
        for agent in &ctx.script.agents {
            let mut java = String::new();
            java.push_str(&format!(
                "public class {} implements it.isislab.dmason.sim.engine.DistributedAgent {{\n",
                agent.name
            ));
            for member in &agent.members {
                java.push_str(&format!("    /* {} : {} */\n", member.name, member.resolved_type));
            }
            java.push_str("}\n");
            write_asset(&ctx.config.asset_dir, &format!("{}.java", agent.name), &java)?;
        }
        Ok(())
    }
}
