use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use figcui_lib::output::FIGCUI_OUTPUT_VERSION;
use figcui_lib::{CuiError, ErrorOutput, FigcuiOutput};

use crate::cli::OutputFormat;

/// Log lines shown in the human-readable report.
const MAX_PRETTY_LOG_LINES: usize = 10;

/// Write output in the requested format.
pub fn write_output(
    body: &FigcuiOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the fatal exit code.
pub fn render_error(err: CuiError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = FigcuiOutput::Error(ErrorOutput {
        version: FIGCUI_OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    ExitCode::from(2)
}

/// Write JSON output to file or stdout.
fn write_json_output(
    body: &FigcuiOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &FigcuiOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &FigcuiOutput, colorize: bool) -> String {
    match body {
        FigcuiOutput::Generate(out) => {
            let mut buf = String::new();
            let header = color("[GENERATE]", "36", colorize);
            writeln!(
                buf,
                "{} {} from frame \"{}\"",
                header, out.class_name, out.frame_name
            )
            .ok();
            writeln!(buf, "Input: {} ({:?})", out.input.value, out.input.kind).ok();
            writeln!(buf, "Elements: {}", out.element_count).ok();
            if !out.images.is_empty() {
                let uploaded = format!("{}/{} uploaded", out.uploaded, out.images.len());
                let code = if out.uploaded == out.images.len() {
                    "32"
                } else {
                    "33"
                };
                writeln!(buf, "Images: {}", color(&uploaded, code, colorize)).ok();
            }
            writeln!(buf, "Plugin:  {}", out.plugin_path.display()).ok();
            writeln!(buf, "Summary: {}", out.summary_path.display()).ok();
            write_log(&mut buf, &out.log);
            buf
        }
        FigcuiOutput::Import(out) => {
            let mut buf = String::new();
            let header = color("[IMPORT]", "34", colorize);
            writeln!(
                buf,
                "{} {} ({} nodes, root {})",
                header, out.name, out.node_count, out.root_id
            )
            .ok();
            if out.skipped > 0 {
                let skipped = format!("{} nodes skipped", out.skipped);
                writeln!(buf, "{}", color(&skipped, "33", colorize)).ok();
            }
            if let Some(path) = &out.snapshot_path {
                writeln!(buf, "Snapshot: {}", path.display()).ok();
            }
            write_log(&mut buf, &out.log);
            buf
        }
        FigcuiOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

fn write_log(buf: &mut String, log: &[String]) {
    if log.is_empty() {
        return;
    }
    writeln!(buf, "Log:").ok();
    for line in log.iter().take(MAX_PRETTY_LOG_LINES) {
        writeln!(buf, "- {line}").ok();
    }
    if log.len() > MAX_PRETTY_LOG_LINES {
        writeln!(buf, "  ({} more)", log.len() - MAX_PRETTY_LOG_LINES).ok();
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}
