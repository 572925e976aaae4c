//! MASON 2 backend: same object model as MASON, with continuous-space
//! field classes the MASON 1 backend doesn't emit.

use super::{write_asset, Backend, Context};

pub struct Mason2Backend;

impl Backend for Mason2Backend {
    fn name(&self) -> &'static str {
        "mason2"
    }

    fn check_compatible(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()> {
        for agent in &ctx.script.agents {
            let mut java = String::new();
            java.push_str(&format!(
                "public class {} implements sim.engine.Steppable {{\n",
                agent.name
            ));
            for member in &agent.members {
                java.push_str(&format!("    /* {} : {} */\n", member.name, member.resolved_type));
            }
            java.push_str("    public void step(sim.engine.SimState state) {\n    }\n");
            java.push_str("}\n");
            write_asset(&ctx.config.asset_dir, &format!("{}.java", agent.name), &java)?;
        }
        if ctx.script.environment.min.is_some() {
            let field = "public sim.field.continuous.Continuous2D space;\n";
            write_asset(&ctx.config.asset_dir, "Space.java", field)?;
        }
        Ok(())
    }
}
