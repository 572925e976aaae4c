//! C/OpenMP backend: the least constrained target, since it runs on the
//! host and can reallocate agent arrays freely.

use super::{write_asset, Backend, Context};

pub struct CBackend;

impl Backend for CBackend {
    fn name(&self) -> &'static str {
        "c"
    }

    fn check_compatible(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    fn emit(&self, ctx: &Context<'_>) -> std::io::Result<()> {
        let mut out = String::new();
        out.push_str("/* generated by abmc: C/OpenMP backend */\n");
        out.push_str("#include <stdlib.h>\n#include <math.h>\n\n");
        for agent in &ctx.script.agents {
            out.push_str(&format!("typedef struct {{\n"));
            for member in &agent.members {
                out.push_str(&format!("    /* {} : {} */\n", member.name, member.resolved_type));
            }
            out.push_str(&format!("}} {}_t;\n\n", agent.name));
        }
        for flame_agent in &ctx.model.agents {
            for func in &flame_agent.funcs {
                out.push_str(&format!("void {}(void);\n", func.name));
            }
        }
        write_asset(&ctx.config.asset_dir, "model.c", &out)
    }
}
