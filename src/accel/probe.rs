use log::{debug, info};

use super::AccelError;

/// Edge length of the scratch surface allocated while probing.
const PROBE_SURFACE_SIZE: i32 = 256;

/// Knobs for the accelerated path, taken from the `performance` config section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelSettings {
    pub enabled: bool,
    pub max_surface_dimension: i32,
    pub grid_cell_size: f64,
}

impl Default for AccelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_surface_dimension: 8192,
            grid_cell_size: 64.0,
        }
    }
}

/// What the probe established about the accelerated path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    pub max_surface_dimension: i32,
    pub grid_cell_size: f64,
}

/// Checks once whether the cached implementation can be used.
///
/// Runs the offscreen allocation test on a blocking task so startup never
/// stalls the caller. Any error simply means the software path stays active.
pub async fn probe(settings: AccelSettings) -> Result<Capabilities, AccelError> {
    if !settings.enabled {
        info!("Acceleration disabled; using software rendering");
        return Err(AccelError::Disabled);
    }

    let result = tokio::task::spawn_blocking(move || probe_blocking(settings))
        .await
        .map_err(|e| AccelError::Probe(e.to_string()))?;

    match &result {
        Ok(caps) => debug!("Acceleration probe succeeded: {:?}", caps),
        Err(err) => info!("Acceleration unavailable: {}", err),
    }
    result
}

fn probe_blocking(settings: AccelSettings) -> Result<Capabilities, AccelError> {
    if settings.max_surface_dimension < PROBE_SURFACE_SIZE {
        return Err(AccelError::SurfaceTooLarge {
            width: PROBE_SURFACE_SIZE,
            height: PROBE_SURFACE_SIZE,
            limit: settings.max_surface_dimension,
        });
    }

    // Cairo objects are not Send; allocate and drop them on this thread.
    let surface = cairo::ImageSurface::create(
        cairo::Format::ARgb32,
        PROBE_SURFACE_SIZE,
        PROBE_SURFACE_SIZE,
    )?;
    let ctx = cairo::Context::new(&surface)?;
    ctx.set_source_rgba(0.0, 0.0, 0.0, 1.0);
    ctx.paint()?;
    drop(ctx);

    Ok(Capabilities {
        max_surface_dimension: settings.max_surface_dimension,
        grid_cell_size: settings.grid_cell_size.max(8.0),
    })
}
