//! Print resolved settings

use crate::context::Context;
use crate::error::Result;

/// Run the settings command
pub fn run_settings(ctx: &Context) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
    } else {
        print!("{}", toml::to_string_pretty(&ctx.settings)?);
    }
    Ok(())
}
