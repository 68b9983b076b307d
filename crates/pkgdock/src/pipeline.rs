use std::path::{Path, PathBuf};

use pkgdock_build::{
    DOCKERFILE, ENTRYPOINT, StageOutcome, Template, Variables, Workspace, write_artifact,
};
use pkgdock_core::{BuildEnv, ReleaseTag, ResolvedConfig, WorkingContext};
use pkgdock_engine::{CommandExecutor, EngineClient, Invocation, RealExecutor, RunSpec, git};

use crate::error::{Error, Result};
use crate::stage::Stage;

/// Environment variable carrying the release tag into build containers.
pub const RELEASE_ENV: &str = "RELEASE";

/// Environment variable carrying the build target into build containers.
pub const TARGET_ENV: &str = "TARGET";

/// Working context for `stage`: the configured `workdir` for build stages,
/// `base` untouched for introspection.
pub fn context_for(stage: Stage, base: &Path, config: &ResolvedConfig) -> Result<WorkingContext> {
    if stage.enters_workdir() {
        Ok(WorkingContext::enter(base, config.workdir.as_deref())?)
    } else {
        Ok(WorkingContext::new(base))
    }
}

/// `show` output: one aligned `key -> value` line per option, or JSON.
pub fn show_report(config: &ResolvedConfig, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(config).map_err(|e| Error::Serialize { source: e });
    }
    Ok(config
        .entries()
        .into_iter()
        .map(|(key, value)| format!("     {key:12} -> {value}\n"))
        .collect())
}

/// Sequences the stages of one invocation.
///
/// Every external process goes through the executor, one at a time, in
/// the working context. Failures abort the stage immediately; partial state
/// stays on disk until an explicit `clear`.
pub struct Pipeline<'a, E: CommandExecutor = RealExecutor> {
    config: &'a ResolvedConfig,
    ctx: &'a WorkingContext,
    env: &'a BuildEnv,
    engine: EngineClient<E>,
    workspace: Workspace,
}

impl<'a> Pipeline<'a, RealExecutor> {
    pub fn new(config: &'a ResolvedConfig, ctx: &'a WorkingContext, env: &'a BuildEnv) -> Self {
        Self::with_executor(config, ctx, env, RealExecutor)
    }
}

impl<'a, E: CommandExecutor> Pipeline<'a, E> {
    pub fn with_executor(
        config: &'a ResolvedConfig,
        ctx: &'a WorkingContext,
        env: &'a BuildEnv,
        executor: E,
    ) -> Self {
        Self {
            config,
            ctx,
            env,
            engine: EngineClient::with_executor(&config.engine, executor),
            workspace: Workspace::new(ctx.root()),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run one stage to completion.
    ///
    /// Returns the text the stage wants on stdout, if any (`show`).
    pub async fn run(&self, stage: Stage) -> Result<Option<String>> {
        tracing::debug!(stage = %stage, root = %self.ctx.root().display(), "stage started");
        let output = match stage {
            Stage::Image => {
                self.image().await?;
                None
            }
            Stage::Package { remove } => {
                self.package(remove).await?;
                None
            }
            Stage::Shell => {
                self.shell().await?;
                None
            }
            Stage::Generate => {
                self.generate().await?;
                None
            }
            Stage::Clear => {
                self.clear()?;
                None
            }
            Stage::Show { json } => Some(show_report(self.config, json)?),
        };
        tracing::debug!(stage = %stage, "stage finished");
        Ok(output)
    }

    /// `<build>` or `<build>.git<commit>`, depending on the `git` option.
    pub async fn compute_release(&self) -> Result<ReleaseTag> {
        let commit = if self.config.git {
            Some(git::short_commit(self.engine.executor(), self.ctx.root()).await?)
        } else {
            None
        };
        Ok(ReleaseTag::new(&self.env.build_number, commit.as_ref()))
    }

    // ── Stages ──

    /// Render `Dockerfile`, and `entrypoint.sh` when its template exists.
    ///
    /// Both templates are loaded and checked before `git` is queried, and
    /// rendered before either file is written. Returns the written paths.
    pub async fn generate(&self) -> Result<Vec<PathBuf>> {
        let dockerfile = Template::load(&self.ctx.path(&self.config.dockerfile))?;
        let entrypoint_path = self.ctx.path(&self.config.entrypoint);
        let entrypoint = if entrypoint_path.exists() {
            Some(Template::load(&entrypoint_path)?)
        } else {
            tracing::debug!(
                path = %entrypoint_path.display(),
                "no entrypoint template; skipping"
            );
            None
        };

        let provisional = ReleaseTag::new(&self.env.build_number, None);
        let known = Variables::standard(self.config, self.env, &provisional);
        dockerfile.check(&known)?;
        if let Some(template) = &entrypoint {
            template.check(&known)?;
        }

        let release = self.compute_release().await?;
        let vars = Variables::standard(self.config, self.env, &release);
        tracing::info!(
            userid = self.env.identity.uid,
            groupid = self.env.identity.gid,
            release = %release,
            build_target = self.config.target.as_deref().unwrap_or_default(),
            "generating artifacts"
        );

        let dockerfile = dockerfile.render(&vars)?;
        tracing::debug!(content = %dockerfile, "rendered Dockerfile");
        let entrypoint = match entrypoint {
            Some(template) => {
                let content = template.render(&vars)?;
                tracing::debug!(content = %content, "rendered entrypoint");
                Some(content)
            }
            None => None,
        };

        let mut written = Vec::new();
        let dockerfile_out = self.ctx.path(DOCKERFILE);
        write_artifact(&dockerfile_out, &dockerfile, false)?;
        written.push(dockerfile_out);

        if let Some(content) = entrypoint {
            let entrypoint_out = self.ctx.path(ENTRYPOINT);
            write_artifact(&entrypoint_out, &content, true)?;
            written.push(entrypoint_out);
        }
        Ok(written)
    }

    /// Generate, build the image, then tag it with a non-default build number.
    pub async fn image(&self) -> Result<()> {
        self.generate().await?;

        let image = &self.config.image;
        let build = &self.env.build_number;
        tracing::info!(image = %image, build = %build, "building image");

        self.engine
            .build_image(self.ctx.root(), image)
            .await
            .map_err(|e| Error::ExternalTool {
                stage: Stage::Image,
                source: e,
            })?;

        if !build.is_default() {
            self.engine
                .tag_image(
                    self.ctx.root(),
                    &format!("{image}:latest"),
                    &format!("{image}:{build}"),
                )
                .await
                .map_err(|e| Error::ExternalTool {
                    stage: Stage::Image,
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Clear (optionally), stage, prepare, compute the release, build.
    ///
    /// The order is fixed: the build must see a workspace staged after any
    /// clear and the output of the prepare command.
    pub async fn package(&self, remove: bool) -> Result<()> {
        if remove {
            self.clear()?;
        }
        self.stage_workspace()?;

        if let Some(command) = &self.config.prepare {
            self.run_prepare(command).await?;
        }

        let release = self.compute_release().await?;
        tracing::info!(release = %release, image = %self.config.image, "building package");

        self.engine
            .run_container(self.ctx.root(), &self.run_spec(&release))
            .await
            .map_err(|e| Error::ExternalTool {
                stage: Stage::Package { remove },
                source: e,
            })
    }

    /// Interactive shell with the same mount and environment as `package`.
    pub async fn shell(&self) -> Result<()> {
        self.stage_workspace()?;
        let release = self.compute_release().await?;
        tracing::info!(image = %self.config.image, "starting interactive shell");

        self.engine
            .run_container(
                self.ctx.root(),
                &self.run_spec(&release).interactive_shell(),
            )
            .await
            .map_err(|e| Error::ExternalTool {
                stage: Stage::Shell,
                source: e,
            })
    }

    /// Remove rendered artifacts and the workspace.
    pub fn clear(&self) -> Result<Vec<PathBuf>> {
        let paths = [DOCKERFILE, ENTRYPOINT, pkgdock_build::WORKSPACE_DIR].join(", ");
        tracing::info!(paths = %paths, "removing temporary files");
        Ok(self.workspace.clear::<&str>(&[])?)
    }

    // ── Helpers ──

    fn stage_workspace(&self) -> Result<StageOutcome> {
        let outcome = self.workspace.stage_default()?;
        if outcome == StageOutcome::NoSource {
            tracing::warn!(
                root = %self.ctx.root().display(),
                "no rpmbuild/, debbuild/ or volume/ tree to stage"
            );
        }
        Ok(outcome)
    }

    async fn run_prepare(&self, command: &str) -> Result<()> {
        tracing::info!(command = %command, "running prepare command");
        self.engine
            .executor()
            .exec_streaming(&Invocation::shell(command, self.ctx.root()))
            .await
            .map_err(|e| Error::Prepare {
                command: command.to_owned(),
                source: e,
            })
    }

    fn run_spec(&self, release: &ReleaseTag) -> RunSpec {
        let spec = RunSpec::new(&self.config.image, self.workspace.path())
            .env(RELEASE_ENV, release.as_str());
        match &self.config.target {
            Some(target) => spec.env(TARGET_ENV, target),
            None => spec,
        }
    }
}
