use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use compositor::{
    AlwaysMapped, CameraConfig, DecodeService, MaskPolicy, Presenter, PresenterConfig,
    SoftwareJpegBackend, StepOutcome, SystemClock,
};
use frameconfig::FrameConfig;
use sdfpack::{AssetHandle, AssetRepository, PathResolver};
use tracing_subscriber::EnvFilter;

use crate::assets::bind_pack;
use crate::cli::{parse_surface_size, Cli};
use crate::paths::AppPaths;
use crate::sink::CaptureSink;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_path = paths.config_file(cli.config.as_deref())?;
    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config = FrameConfig::from_toml_str(&raw)
        .with_context(|| format!("invalid configuration {}", config_path.display()))?;
    tracing::debug!(
        config = %config_path.display(),
        config_dir = %paths.config_dir().display(),
        data_dir = %paths.data_dir().display(),
        assets = config.assets.len(),
        "resolved fieldframe configuration"
    );

    let (width, height) = match cli.size.as_deref() {
        Some(value) => parse_surface_size(value)?,
        None => (config.display.width, config.display.height),
    };

    let resolver = PathResolver::new()?;
    let repository = AssetRepository::new(paths.pack_roots());
    let mut assets = Vec::with_capacity(config.assets.len());
    for entry in &config.assets {
        let handle = asset_handle(&resolver, &entry.handle)?;
        let pack = repository.resolve(&handle)?;
        let asset = bind_pack(&pack)?;
        tracing::info!(
            handle = %handle,
            layers = asset.layer_count(),
            size = format!("{}x{}", asset.width(), asset.height()),
            "asset pack ready"
        );
        assets.push(asset);
    }

    let seed = cli
        .seed
        .or(config.rotation.seed)
        .unwrap_or_else(entropy_seed);

    let presenter_config = PresenterConfig {
        width,
        height,
        camera: CameraConfig {
            pan_up_ms: config.camera.pan_up.as_millis() as u64,
            pan_down_ms: config.camera.pan_down.as_millis() as u64,
            zoom_ms: config.camera.zoom.as_millis() as u64,
        },
        rotation_seed: seed,
        mask_policy: MaskPolicy::Skip,
    };
    let decoder = DecodeService::new(SoftwareJpegBackend::new(), AlwaysMapped);
    let mut presenter = Presenter::new(presenter_config, assets, decoder)?;
    let clock = SystemClock::new();
    let mut sink = CaptureSink::new(width, height);

    let tick = config.display.tick;
    tracing::info!(
        width,
        height,
        tick_ms = tick.as_millis() as u64,
        seed,
        "fieldframe daemon running"
    );

    let mut completed_passes: u64 = 0;
    let mut ticks_run: u64 = 0;
    loop {
        let report = presenter.tick(&clock, &mut sink);
        if report.outcome == StepOutcome::Completed {
            completed_passes += 1;
            tracing::info!(
                pass = completed_passes,
                asset = report.active_asset,
                "composite pass complete"
            );
        }

        ticks_run += 1;
        if cli.ticks != 0 && ticks_run >= cli.ticks {
            break;
        }
        thread::sleep(tick);
    }

    if let Some(path) = &cli.export {
        sink.export_png(path)?;
        tracing::info!(path = %path.display(), "exported final frame");
    }
    tracing::info!(ticks = ticks_run, passes = completed_passes, "shutting down");
    Ok(())
}

/// Turns a config handle into an asset handle, expanding `~` and `$VAR`
/// references in path-shaped inputs.
fn asset_handle(resolver: &PathResolver, input: &str) -> Result<AssetHandle> {
    let trimmed = input.trim();
    if trimmed.contains(std::path::MAIN_SEPARATOR) || trimmed.starts_with(['~', '$', '.']) {
        let path = resolver.normalize_local_path(trimmed)?;
        return Ok(AssetHandle::PackDir(path));
    }
    Ok(AssetHandle::from_input(trimmed))
}

fn entropy_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_stay_named_handles() {
        let resolver = PathResolver::with_cwd("/");
        let handle = asset_handle(&resolver, "ammonite").unwrap();
        assert_eq!(handle, AssetHandle::Named("ammonite".into()));
    }

    #[test]
    fn path_handles_resolve_against_the_working_directory() {
        let temp = tempfile::tempdir().unwrap();
        let pack_dir = temp.path().join("packs").join("fern");
        std::fs::create_dir_all(&pack_dir).unwrap();

        let resolver = PathResolver::with_cwd(temp.path());
        let handle = asset_handle(&resolver, "packs/fern").unwrap();
        assert_eq!(handle.pack_dir(), Some(pack_dir.as_path()));
    }

    #[test]
    fn env_references_are_expanded() {
        std::env::set_var("FIELDFRAME_RUN_TEST_DIR", "/opt/art");
        let resolver = PathResolver::with_cwd("/");
        let handle = asset_handle(&resolver, "$FIELDFRAME_RUN_TEST_DIR/fern").unwrap();
        assert_eq!(
            handle.pack_dir(),
            Some(std::path::Path::new("/opt/art/fern"))
        );
        std::env::remove_var("FIELDFRAME_RUN_TEST_DIR");
    }
}
