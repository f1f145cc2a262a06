//! Offscreen compositing of the current page bitmap.
//!
//! Converting an RGBA bitmap to a cairo surface and scaling it is far more
//! expensive than blitting a ready surface, so the layer is rebuilt only when
//! the page, the view transform or the device size changes.

use crate::pages::RenderedPage;
use crate::util::ViewTransform;
use image::RgbaImage;
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct LayerKey {
    page_number: u32,
    transform: ViewTransform,
    width: i32,
    height: i32,
}

/// Device-sized surface holding the page bitmap as it will appear on screen.
#[derive(Default)]
pub struct BackgroundLayer {
    key: Option<LayerKey>,
    surface: Option<cairo::ImageSurface>,
    rebuilds: u64,
}

impl BackgroundLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the layer up to date; returns true when it was recomposited.
    ///
    /// Passing `None` drops the layer (the page has no bitmap yet).
    pub fn update(
        &mut self,
        page: Option<&Arc<RenderedPage>>,
        transform: ViewTransform,
        width: i32,
        height: i32,
    ) -> bool {
        let Some(page) = page else {
            self.key = None;
            self.surface = None;
            return false;
        };

        let key = LayerKey {
            page_number: page.page_number,
            transform,
            width,
            height,
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        self.surface = match composite(page, transform, width, height) {
            Ok(surface) => Some(surface),
            Err(err) => {
                warn!(
                    "Failed to composite background for page {}: {}",
                    page.page_number, err
                );
                None
            }
        };
        self.key = Some(key);
        self.rebuilds += 1;
        debug!(
            "Recomposited background for page {} at {}x{}",
            page.page_number, width, height
        );
        true
    }

    pub fn has_background(&self) -> bool {
        self.surface.is_some()
    }

    /// How many times the layer has been recomposited.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Blits the layer; returns false when there is nothing to draw.
    pub fn paint(&self, ctx: &cairo::Context) -> bool {
        let Some(surface) = &self.surface else {
            return false;
        };
        let _ = ctx.save();
        if ctx.set_source_surface(surface, 0.0, 0.0).is_ok() {
            let _ = ctx.paint();
        }
        let _ = ctx.restore();
        true
    }
}

fn composite(
    page: &RenderedPage,
    transform: ViewTransform,
    width: i32,
    height: i32,
) -> Result<cairo::ImageSurface, cairo::Error> {
    let bitmap = rgba_to_surface(&page.image)?;
    let target = cairo::ImageSurface::create(cairo::Format::ARgb32, width.max(1), height.max(1))?;
    {
        let ctx = cairo::Context::new(&target)?;
        ctx.translate(transform.offset_x, transform.offset_y);
        ctx.scale(transform.scale, transform.scale);

        // Bitmap pixels map onto the page's document size.
        let (img_w, img_h) = page.image.dimensions();
        if img_w > 0 && img_h > 0 {
            ctx.scale(page.width / img_w as f64, page.height / img_h as f64);
        }
        ctx.set_source_surface(&bitmap, 0.0, 0.0)?;
        ctx.source().set_filter(cairo::Filter::Good);
        ctx.paint()?;
    }
    target.flush();
    Ok(target)
}

/// Converts straight RGBA into cairo's premultiplied native-endian ARGB32.
pub fn rgba_to_surface(image: &RgbaImage) -> Result<cairo::ImageSurface, cairo::Error> {
    let (w, h) = image.dimensions();
    let (w, h) = (w as i32, h as i32);
    let stride = cairo::Format::ARgb32.stride_for_width(w as u32)?;
    let mut data = vec![0u8; stride as usize * h as usize];

    for (x, y, px) in image.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        let premul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        let argb = u32::from(a) << 24
            | u32::from(premul(r)) << 16
            | u32::from(premul(g)) << 8
            | u32::from(premul(b));
        let offset = y as usize * stride as usize + x as usize * 4;
        data[offset..offset + 4].copy_from_slice(&argb.to_ne_bytes());
    }

    cairo::ImageSurface::create_for_data(data, cairo::Format::ARgb32, w, h, stride)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn page(n: u32, color: [u8; 4]) -> Arc<RenderedPage> {
        Arc::new(RenderedPage {
            page_number: n,
            width: 100.0,
            height: 100.0,
            image: RgbaImage::from_pixel(10, 10, Rgba(color)),
        })
    }

    #[test]
    fn converts_and_premultiplies() {
        let image = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 128]));
        let mut surface = rgba_to_surface(&image).unwrap();
        let data = surface.data().unwrap();
        let px = u32::from_ne_bytes([data[0], data[1], data[2], data[3]]);
        assert_eq!(px >> 24, 128);
        assert_eq!((px >> 16) & 0xff, 128);
        assert_eq!(px & 0xffff, 0);
    }

    #[test]
    fn rebuilds_only_when_inputs_change() {
        let mut layer = BackgroundLayer::new();
        let first = page(1, [0, 0, 255, 255]);
        let transform = ViewTransform::identity();

        assert!(layer.update(Some(&first), transform, 100, 100));
        assert!(!layer.update(Some(&first), transform, 100, 100));
        assert!(layer.update(Some(&first), ViewTransform::with_scale(2.0), 100, 100));
        assert!(layer.update(Some(&page(2, [0, 0, 0, 255])), ViewTransform::with_scale(2.0), 100, 100));
        assert_eq!(layer.rebuilds(), 3);
        assert!(layer.has_background());

        assert!(!layer.update(None, transform, 100, 100));
        assert!(!layer.has_background());
    }

    #[test]
    fn paint_fills_device_surface() {
        let mut layer = BackgroundLayer::new();
        layer.update(Some(&page(1, [0, 255, 0, 255])), ViewTransform::identity(), 50, 50);

        let mut target = cairo::ImageSurface::create(cairo::Format::ARgb32, 50, 50).unwrap();
        {
            let ctx = cairo::Context::new(&target).unwrap();
            assert!(layer.paint(&ctx));
        }
        target.flush();
        let stride = target.stride() as usize;
        let data = target.data().unwrap();
        let i = 25 * stride + 25 * 4;
        let px = u32::from_ne_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        assert_eq!(px, 0xff00_ff00);
    }
}
