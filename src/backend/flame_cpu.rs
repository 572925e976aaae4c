//! FLAME CPU backend: the reference target for the Flame model's
//! `start -> 1 -> 2 -> ...` state chains and message-passing transitions.

use super::{write_asset, Backend, Context};

pub struct FlameCpuBackend;

impl Backend for FlameCpuBackend {
    fn name(&self) -> &'static str {
        "flamecpu"
    }

    fn check_compatible(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()> {
        let mut xml = String::new();
        xml.push_str("<xmodel>\n");
        for flame_agent in &ctx.model.agents {
            let name = &ctx.script.agent(flame_agent.agent).name;
            xml.push_str(&format!("  <xagent>\n    <name>{name}</name>\n"));
            xml.push_str("    <states>\n");
            for state in &flame_agent.states {
                xml.push_str(&format!("      <state><name>{}</name></state>\n", state.name));
            }
            xml.push_str("    </states>\n");
            for func in &flame_agent.funcs {
                xml.push_str(&format!("    <function><name>{}</name></function>\n", func.name));
            }
            xml.push_str("  </xagent>\n");
        }
        for message in &ctx.model.messages {
            xml.push_str(&format!("  <message>\n    <name>{}</name>\n", message.name));
            for field in &message.fields {
                xml.push_str(&format!("    <variable><name>{}</name><type>{}</type></variable>\n", field.name, field.ty));
            }
            xml.push_str("  </message>\n");
        }
        xml.push_str("</xmodel>\n");
        write_asset(&ctx.config.asset_dir, "XMLModelFile.xml", &xml)
    }
}
