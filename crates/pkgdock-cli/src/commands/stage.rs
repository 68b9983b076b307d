use pkgdock::{BuildEnv, Pipeline, Stage, context_for};

use super::Settings;

/// Resolve the invocation and run `stage` through the pipeline.
pub async fn run_stage(settings: &Settings, stage: Stage) -> anyhow::Result<()> {
    let config = settings.resolve()?;
    let ctx = context_for(stage, &super::current_dir()?, &config)?;
    let env = BuildEnv::capture();
    tracing::debug!(
        section = %config.section,
        stage = %stage,
        root = %ctx.root().display(),
        build_number = %env.build_number,
        "invocation resolved"
    );

    if let Some(output) = Pipeline::new(&config, &ctx, &env).run(stage).await? {
        print!("{output}");
    }

    if stage == Stage::Clear {
        println!("Removed generated files and {}/", pkgdock::build::WORKSPACE_DIR);
    }
    Ok(())
}
