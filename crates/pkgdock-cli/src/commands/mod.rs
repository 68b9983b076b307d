mod stage;

use std::path::PathBuf;

use pkgdock::ResolvedConfig;

pub use stage::run_stage;

/// Options shared by every subcommand.
pub struct Settings {
    pub config: PathBuf,
    pub section: String,
    pub debug: bool,
}

impl Settings {
    fn resolve(&self) -> pkgdock::Result<ResolvedConfig> {
        let config = ResolvedConfig::resolve(&self.config, &self.section)?;
        if self.debug {
            for (key, value) in config.entries() {
                tracing::debug!(key, value = %value, "resolved option");
            }
        }
        Ok(config)
    }
}

/// Process status for a failed command.
///
/// pkgdock errors carry their own code; anything else is a generic failure.
/// Codes outside `1..=255` cannot be reported and collapse to 1.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .downcast_ref::<pkgdock::Error>()
        .map_or(pkgdock::exit_code::FAILURE, pkgdock::Error::exit_code);
    match u8::try_from(code) {
        Ok(status) if status != 0 => status,
        _ => 1,
    }
}

fn current_dir() -> anyhow::Result<PathBuf> {
    Ok(std::env::current_dir()?)
}
