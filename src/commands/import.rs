use std::path::{Path, PathBuf};
use std::process::ExitCode;

use figcui_lib::output::{FIGCUI_OUTPUT_VERSION, ImportOutput, InputDescriptor, InputKind};
use figcui_lib::{
    run_import, CuiError, FigcuiOutput, MemoryScene, SceneHost, SessionSettings,
};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::progress::{report, stderr_progress, ProgressCallback};
use crate::settings::{load_config, log_effective_config};

/// Run the import command.
pub async fn run_import_command(
    config_path: Option<PathBuf>,
    verbose: bool,
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, None),
    };
    if verbose {
        log_effective_config(config_path.as_deref(), &config);
    }

    let progress = stderr_progress(verbose);
    let settings = SessionSettings::from(&config);
    match import(&input, output.as_deref(), settings, progress.as_ref()).await {
        Ok(body) => {
            if let Err(err) = write_output(&FigcuiOutput::Import(body), format, None) {
                return render_error(CuiError::Config(err.to_string()), format, None);
            }
            ExitCode::SUCCESS
        }
        Err(err) => render_error(err, format, None),
    }
}

async fn import(
    input: &Path,
    output: Option<&Path>,
    settings: SessionSettings,
    progress: Option<&ProgressCallback>,
) -> Result<ImportOutput, CuiError> {
    report(progress, &format!("Reading {}…", input.display()));
    let raw = std::fs::read_to_string(input).map_err(|e| {
        CuiError::Config(format!("Input file not found or unreadable: {}: {e}", input.display()))
    })?;
    let data: serde_json::Value = serde_json::from_str(&raw)?;

    report(progress, "Rebuilding node tree…");
    let (loaded, scene) = run_import(MemoryScene::new(), data, settings).await?;
    let root = scene
        .page_nodes()
        .last()
        .copied()
        .ok_or_else(|| CuiError::Unknown("imported tree is not on the page".to_string()))?;
    let snapshot = scene.snapshot(root)?;

    let snapshot_path = match output {
        Some(path) => {
            report(progress, &format!("Writing snapshot {}", path.display()));
            std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
            Some(path.to_path_buf())
        }
        None => None,
    };

    Ok(ImportOutput {
        version: FIGCUI_OUTPUT_VERSION.to_string(),
        input: InputDescriptor {
            kind: InputKind::Document,
            value: input.display().to_string(),
        },
        root_id: loaded.root_id,
        name: loaded.name,
        node_count: loaded.node_count,
        skipped: loaded.skipped,
        log: loaded.log,
        snapshot: snapshot_path.is_none().then_some(snapshot),
        snapshot_path,
    })
}
