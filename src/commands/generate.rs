use std::path::{Path, PathBuf};
use std::process::ExitCode;

use figcui_lib::figma::{fetch_snapshot, FigmaAuth, FigmaClient, FigmaRasterizer};
use figcui_lib::output::{FIGCUI_OUTPUT_VERSION, GenerateOutput, InputDescriptor, InputKind};
use figcui_lib::{
    parse_input, run_generation, AssetMode, Config, CuiError, DesignNode, FigcuiOutput,
    FlatRasterizer, Generation, InputSource, MemoryScene, SessionSettings, UploadTarget,
};
use figcui_lib::upload::DirectoryWriter;

use tracing::warn;

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::progress::{report, stderr_progress, ProgressCallback};
use crate::settings::{
    apply_overrides, load_config, log_effective_config, resolve_api_token, GenerateOverrides,
};

pub const SUMMARY_FILE: &str = "summary.txt";
const IMAGES_DIR: &str = "images";

/// Run the generate command.
#[allow(clippy::too_many_arguments)]
pub async fn run_generate(
    config_path: Option<PathBuf>,
    verbose: bool,
    input: String,
    output_dir: PathBuf,
    endpoint: Option<String>,
    api_token: Option<String>,
    scale: Option<f64>,
    author: Option<String>,
    asset_mode: Option<AssetMode>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()).and_then(|cfg| {
        apply_overrides(
            cfg,
            GenerateOverrides {
                endpoint,
                scale,
                author,
                asset_mode,
            },
            config_path.as_deref(),
        )
    }) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    if verbose {
        log_effective_config(config_path.as_deref(), &config);
    }

    let progress = stderr_progress(verbose);
    let token = resolve_api_token(api_token);
    match generate(&config, &input, &output_dir, token, progress.as_ref()).await {
        Ok(body) => {
            if let Err(err) = write_output(&FigcuiOutput::Generate(body), format, output.clone()) {
                return render_error(CuiError::Config(err.to_string()), format, output);
            }
            ExitCode::SUCCESS
        }
        Err(err) => render_error(err, format, output),
    }
}

async fn generate(
    config: &Config,
    input: &str,
    output_dir: &Path,
    token: Option<String>,
    progress: Option<&ProgressCallback>,
) -> Result<GenerateOutput, CuiError> {
    report(progress, "Parsing input…");
    let source = parse_input(input).map_err(|e| CuiError::Config(e.to_string()))?;

    std::fs::create_dir_all(output_dir)?;
    let uploader = UploadTarget::from_config(&config.upload, output_dir.join(IMAGES_DIR))?;
    let settings = SessionSettings::from(config);

    let (kind, generation) = match source {
        InputSource::Snapshot(path) => {
            report(progress, &format!("Reading snapshot {}…", path.display()));
            let raw = std::fs::read_to_string(&path)?;
            let root: DesignNode = serde_json::from_str(&raw)?;
            let (scene, _) = MemoryScene::from_snapshot(&root);
            report(progress, "Generating…");
            let generation =
                run_generation(scene, FlatRasterizer, settings, token, &uploader).await?;
            (InputKind::Snapshot, generation)
        }
        InputSource::Figma(info) => {
            let auth = FigmaAuth::from_env().ok_or_else(|| {
                CuiError::Config(
                    "FIGMA_TOKEN environment variable is required for Figma URLs".to_string(),
                )
            })?;
            let client = FigmaClient::with_base_url(auth, &config.figma.base_url)?;
            report(
                progress,
                &format!("Fetching node {} from Figma file {}…", info.node_id, info.file_key),
            );
            let root = fetch_snapshot(&client, &info.file_key, &info.node_id).await?;
            let (scene, _) = MemoryScene::from_snapshot(&root);
            let rasterizer = FigmaRasterizer::new(client, info.file_key);
            report(progress, "Generating…");
            let generation = run_generation(scene, rasterizer, settings, token, &uploader).await?;
            (InputKind::Figma, generation)
        }
    };

    if config.asset_mode == AssetMode::Data && !generation.images.is_empty() {
        let images_dir = output_dir.join(IMAGES_DIR);
        report(
            progress,
            &format!("Writing {} images to {}", generation.images.len(), images_dir.display()),
        );
        let written = DirectoryWriter::new(images_dir).write(&generation.images).await?;
        for failure in written.failures {
            warn!(%failure, "could not write image");
        }
    }

    let (plugin_path, summary_path) = write_artifacts(&generation, output_dir, progress)?;
    Ok(GenerateOutput {
        version: FIGCUI_OUTPUT_VERSION.to_string(),
        input: InputDescriptor {
            kind,
            value: input.to_string(),
        },
        class_name: generation
            .plugin_file
            .trim_end_matches(".cs")
            .to_string(),
        frame_name: generation.frame_name,
        element_count: generation.element_count,
        plugin_path,
        summary_path,
        images: generation.files,
        uploaded: generation.uploaded,
        log: generation.log,
    })
}

fn write_artifacts(
    generation: &Generation,
    output_dir: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<(PathBuf, PathBuf), CuiError> {
    let plugin_path = output_dir.join(&generation.plugin_file);
    let summary_path = output_dir.join(SUMMARY_FILE);
    report(progress, &format!("Writing {}", plugin_path.display()));
    std::fs::write(&plugin_path, &generation.plugin)?;
    std::fs::write(&summary_path, &generation.summary)?;
    Ok((plugin_path, summary_path))
}
