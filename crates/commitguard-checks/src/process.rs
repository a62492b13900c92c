//! Running external linters.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use commitguard_core::cmd_to_string;
use tracing::debug;

/// Exit state and combined stdout/stderr of a finished tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

/// Runs `program args...` in `cwd`, optionally feeding `stdin`.
///
/// Stderr is appended to stdout. Spawn failures (including a missing
/// program) come back as the underlying `io::Error`.
pub fn run_tool(
    program: &Path,
    args: &[&str],
    cwd: &Path,
    stdin: Option<&[u8]>,
) -> io::Result<ToolOutput> {
    let program_str = program.to_string_lossy();
    let mut words = vec![program_str.as_ref()];
    words.extend_from_slice(args);
    debug!("running {} in {}", cmd_to_string(&words), cwd.display());

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // The tool may fill its stdout pipe before it has read all of stdin.
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_vec();
            Some(thread::spawn(move || pipe.write_all(&input)))
        }
        _ => None,
    };

    let output = child.wait_with_output()?;
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Err(err)) if err.kind() != io::ErrorKind::BrokenPipe => return Err(err),
            Ok(_) => {}
            Err(_) => return Err(io::Error::other("stdin writer thread panicked")),
        }
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    debug!("{} exited with {}", program.display(), output.status);

    Ok(ToolOutput {
        success: output.status.success(),
        output: text,
    })
}
