use codeon_core::RenderedCommand;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Build a command running in `workdir` with captured output
///
/// The child leads its own process group so a timeout can kill everything it
/// started, and it is killed outright if its handle is dropped.
pub fn command(rendered: &RenderedCommand, workdir: &Path, pipe_stdin: bool) -> Command {
    let mut cmd = Command::new(&rendered.program);
    cmd.args(&rendered.args)
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if pipe_stdin {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }

    configure_platform_specific(&mut cmd);
    cmd
}

fn configure_platform_specific(cmd: &mut Command) {
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }
    #[cfg(not(unix))]
    {
        let _ = cmd;
    }
}
