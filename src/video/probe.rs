//! Media duration probing via `ffprobe`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use super::composer::ComposeError;

/// Read the container duration of `path`.
pub async fn probe_duration(ffprobe: &Path, path: &Path) -> Result<Duration, ComposeError> {
    let output = tokio::process::Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ComposeError::Probe(format!("failed to run {}: {e}", ffprobe.display())))?;

    if !output.status.success() {
        return Err(ComposeError::Probe(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ffprobe's bare `format=duration` output (e.g. `"12.345000\n"`).
pub fn parse_probe_output(stdout: &str) -> Result<Duration, ComposeError> {
    let raw = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let secs: f64 = raw
        .parse()
        .map_err(|_| ComposeError::Probe(format!("unreadable duration {raw:?}")))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(ComposeError::InvalidDuration(secs));
    }
    Ok(Duration::from_secs_f64(secs))
}
