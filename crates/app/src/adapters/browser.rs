use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Platform command that opens a URL in the default browser
fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}

/// Open `url` in the browser. Best effort: failures are only logged.
pub fn open_url(url: &str) {
    let (program, args) = opener();
    match launch(program, args, url) {
        Ok(_) => info!("Opened {} with {}", url, program),
        Err(e) => warn!("Could not open {} with {}: {}", url, program, e),
    }
}

/// Start `program args.. url` detached from the terminal. A background
/// thread waits on the child so it is reaped once it exits.
fn launch(
    program: &str,
    args: &[&str],
    url: &str,
) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = Command::new(program)
        .args(args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let program = program.to_string();
    Ok(thread::spawn(move || {
        let status = child.wait();
        debug!("{} exited: {:?}", program, status);
        status
    }))
}
