// ABOUTME: Exec command implementation.
// ABOUTME: Runs one exec session in a local container and maps its outcome to an exit code.

use crate::cli::ExecArgs;
use hatch::config::Config;
use hatch::error::Result;
use hatch::output::Output;
use hatch::runtime::{RuntimeType, connect_runtime};
use hatch::session::{ExecRequest, SessionCoordinator, SessionOutcome};
use hatch::terminal::{StdTerminal, Streams};
use std::sync::Arc;

/// Runtime selection given on the command line; beats config and environment.
#[derive(Debug, Default)]
pub struct RuntimeOverrides {
    pub socket: Option<String>,
    pub runtime: Option<RuntimeType>,
}

/// Run the command described by `args` and return the local exit code.
pub async fn exec_command(
    mut config: Config,
    overrides: RuntimeOverrides,
    args: ExecArgs,
    output: &Output,
) -> Result<i32> {
    if let Some(socket) = overrides.socket {
        config.socket = Some(socket);
    }
    if let Some(runtime) = overrides.runtime {
        config.runtime = Some(runtime);
    }

    let request = build_request(args)?;

    let runtime = connect_runtime(config.runtime_config().as_ref(), config.api_timeout).await?;
    tracing::debug!(
        runtime = %runtime.runtime_type(),
        socket = runtime.socket_path(),
        "connected"
    );

    let coordinator = SessionCoordinator::new(Arc::new(runtime), config.session_options());
    let outcome = coordinator
        .run(&request, Streams::stdio(), Arc::new(StdTerminal))
        .await?;

    if let SessionOutcome::Exited { diagnostics, .. } = &outcome {
        output.diagnostics(diagnostics);
    }
    if let SessionOutcome::Detached { exec_id } = &outcome {
        tracing::debug!(exec = %exec_id, "started in the background");
    }

    Ok(outcome.exit_code())
}

fn build_request(args: ExecArgs) -> Result<ExecRequest> {
    let mut request = ExecRequest::new(args.container, args.command)?
        .interactive(args.interactive)
        .tty(args.tty)
        .detach(args.detach)
        .attach_stdout(!args.no_stdout)
        .attach_stderr(!args.no_stderr)
        .privileged(args.privileged)
        .env(args.env)?;

    if let Some(user) = args.user {
        request = request.user(user);
    }
    if let Some(dir) = args.workdir {
        request = request.working_dir(dir);
    }
    Ok(request)
}
