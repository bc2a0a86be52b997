//! identity-luma [preset.json] [width height kind]
//!
//! Renders a horizontal luminance ramp through one filter pass and logs the first row.
//! Without a preset the builtin passthrough is used; `kind` is `rgba8` (default) or `rgb565`.

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use shadefilter_core::builtin::BuiltinShader;
use shadefilter_core::image::unpack_rgb565;
use shadefilter_core::{DestImage, FilterPreset, PixelKind, SourceImage};
use shadefilter_runtime_glow::headless_filter;

struct Args {
    preset: Option<String>,
    width: u32,
    height: u32,
    kind: PixelKind,
}

fn parse_args() -> Result<Args> {
    let mut rest: Vec<String> = std::env::args().skip(1).collect();
    let preset = match rest.first() {
        Some(a) if a.ends_with(".json") => Some(rest.remove(0)),
        _ => None,
    };
    let (width, height, kind) = match rest.as_slice() {
        [] => (2, 2, PixelKind::Rgba8),
        [w, h, k] => (
            w.parse().context("width")?,
            h.parse().context("height")?,
            k.parse().context("pixel kind")?,
        ),
        _ => bail!("usage: identity-luma [preset.json] [width height kind]"),
    };
    Ok(Args {
        preset,
        width,
        height,
        kind,
    })
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Left-to-right ramp from 0 to 255, identical on every row.
fn ramp(width: u32, height: u32) -> Vec<u8> {
    let step = 255.0 / width.saturating_sub(1).max(1) as f32;
    (0..height)
        .flat_map(|_| (0..width).map(move |x| (x as f32 * step).round() as u8))
        .collect()
}

fn main() -> Result<()> {
    initialise_tracing();
    let args = parse_args()?;

    let filter = headless_filter("identity-luma");
    match &args.preset {
        Some(path) => {
            let preset = FilterPreset::from_json_path(path)?;
            filter.apply_preset(&preset)?;
            tracing::info!(preset = %path, "preset applied");
        }
        None => filter.set_source(BuiltinShader::Passthrough.source()),
    }

    let lum = ramp(args.width, args.height);
    let src = SourceImage::luminance(args.width, args.height, &lum)?;
    let mut out = vec![0u8; args.width as usize * args.height as usize * args.kind.bytes_per_pixel()];
    let mut dst = DestImage::new(args.width, args.height, args.kind, &mut out)?;

    filter.process(&src, &mut dst).context("filter pass")?;

    let row: Vec<[u8; 3]> = match args.kind {
        PixelKind::Rgba8 => out
            .chunks_exact(4)
            .take(args.width as usize)
            .map(|p| [p[0], p[1], p[2]])
            .collect(),
        PixelKind::Rgb565 => out
            .chunks_exact(2)
            .take(args.width as usize)
            .map(|p| unpack_rgb565(u16::from_ne_bytes([p[0], p[1]])))
            .collect(),
    };
    tracing::info!(
        width = args.width,
        height = args.height,
        kind = %args.kind,
        input = ?&lum[..args.width as usize],
        output = ?row,
        "first row"
    );
    Ok(())
}
