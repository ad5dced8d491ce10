use std::f32::consts::TAU;
use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};

const DOUGH: [u8; 3] = [196, 140, 82];
const DOUGH_DARK: [u8; 3] = [150, 98, 52];
const FROSTING: [u8; 3] = [236, 122, 170];
const SPRINKLES: [[u8; 3]; 4] = [[250, 250, 245], [90, 180, 240], [250, 210, 60], [120, 200, 110]];

/// Load the image at `path`, or paint the built-in donut texture when unset
pub fn load_or_paint(path: Option<&Path>) -> Result<RgbaImage> {
    match path {
        Some(path) => {
            let image = image::open(path)?.to_rgba8();
            if image.width() == 0 || image.height() == 0 {
                return Err(Error::setup(format!("texture {} is empty", path.display())));
            }
            tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "loaded donut texture");
            Ok(image)
        }
        None => Ok(paint_donut(256, 256)),
    }
}

/// Wrap raw, non-premultiplied RGBA8 pixels
pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(Error::setup(format!("texture is empty ({width}x{height})")));
    }
    let len = pixels.len();
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::setup(format!("{len} bytes do not hold a {width}x{height} RGBA texture")))
}

/// Read the pixels of a page `<img>` by drawing it onto a scratch canvas.
///
/// Waits for the image to finish decoding. Cross-origin images taint the
/// canvas and fail here.
#[cfg(target_arch = "wasm32")]
pub async fn from_image_element(img: &web_sys::HtmlImageElement) -> Result<RgbaImage> {
    use wasm_bindgen::JsCast;

    let js = |what: &'static str| move |e: wasm_bindgen::JsValue| Error::setup(format!("{what}: {e:?}"));

    wasm_bindgen_futures::JsFuture::from(img.decode())
        .await
        .map_err(js("texture image did not decode"))?;
    let (width, height) = (img.natural_width(), img.natural_height());

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| Error::setup("no document on window"))?;
    let canvas: web_sys::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(js("failed to create canvas"))?
        .dyn_into()
        .map_err(|_| Error::setup("scratch element is not a canvas"))?;
    canvas.set_width(width);
    canvas.set_height(height);

    let ctx: web_sys::CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(js("no 2d context"))?
        .ok_or_else(|| Error::setup("no 2d context"))?
        .dyn_into()
        .map_err(|_| Error::setup("2d context has the wrong type"))?;
    ctx.draw_image_with_html_image_element(img, 0.0, 0.0)
        .map_err(js("failed to draw texture image"))?;
    let data = ctx
        .get_image_data(0.0, 0.0, width as f64, height as f64)
        .map_err(js("texture image is not readable"))?;

    from_rgba(width, height, data.data().0)
}

/// Frosted donut texture in torus texture space.
///
/// `u` runs around the main axis, `v` around the tube. The outer equator sits
/// at v = 0 and the top of the tube at v = 0.25, so frosting covers the band
/// around the top with a wavy edge and scattered sprinkles.
pub fn paint_donut(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let u = (x as f32 + 0.5) / width as f32;
        let v = (y as f32 + 0.5) / height as f32;

        let height_on_tube = (v * TAU).sin();
        let edge = -0.2 + 0.12 * (u * TAU * 9.0).sin() + 0.05 * (u * TAU * 23.0).sin();

        let rgb = if height_on_tube > edge {
            sprinkle(x, y).unwrap_or(FROSTING)
        } else {
            // darker dough towards the bottom of the tube
            let t = (-height_on_tube).clamp(0.0, 1.0);
            mix(DOUGH, DOUGH_DARK, t)
        };

        Rgba([rgb[0], rgb[1], rgb[2], 255])
    })
}

fn sprinkle(x: u32, y: u32) -> Option<[u8; 3]> {
    // one candidate sprinkle per 8x8 cell, centered at a hashed offset
    let (cx, cy) = (x / 8, y / 8);
    let h = hash(cx, cy);
    if h % 3 != 0 {
        return None;
    }
    let (ox, oy) = (cx * 8 + (h >> 8) % 6 + 1, cy * 8 + (h >> 12) % 6 + 1);
    let horizontal = (h >> 16) & 1 == 0;
    let (dx, dy) = (x.abs_diff(ox), y.abs_diff(oy));
    let inside = if horizontal { dx <= 1 && dy == 0 } else { dx == 0 && dy <= 1 };
    inside.then(|| SPRINKLES[((h >> 20) % SPRINKLES.len() as u32) as usize])
}

fn hash(x: u32, y: u32) -> u32 {
    let mut h = x.wrapping_mul(0x27d4_eb2d) ^ y.wrapping_mul(0x1656_67b1);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h
}

fn mix(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    [lerp(a[0], b[0]), lerp(a[1], b[1]), lerp(a[2], b[2])]
}

/// Texture, view and sampler bound next to the transform uniforms
pub struct DonutTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl DonutTexture {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("donut_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("donut_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        DonutTexture { texture, view, sampler }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn painted_texture_has_frosting_on_top_and_dough_below() {
        let image = paint_donut(64, 64);
        assert_eq!(image.dimensions(), (64, 64));

        // v = 0.25 is the top of the tube, v = 0.75 the bottom
        let top: Vec<_> = (0..64).map(|x| image.get_pixel(x, 16).0).collect();
        assert!(top.iter().filter(|p| p[..3] == FROSTING).count() > 32);
        assert!(image.pixels().all(|p| p[3] == 255));

        let bottom = image.get_pixel(5, 48).0;
        assert_ne!(bottom[..3], FROSTING);
    }

    #[test]
    fn painting_is_deterministic() {
        assert_eq!(paint_donut(32, 16), paint_donut(32, 16));
    }

    #[test]
    fn raw_pixels_must_fill_the_image() {
        let image = from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
        assert_eq!(image.get_pixel(1, 0).0, [0, 255, 0, 255]);

        assert!(matches!(from_rgba(2, 2, vec![0; 8]), Err(Error::SetupFailure(_))));
        assert!(matches!(from_rgba(0, 4, Vec::new()), Err(Error::SetupFailure(_))));
    }

    #[test]
    fn missing_file_is_a_texture_error() {
        let err = load_or_paint(Some(Path::new("does/not/exist.png"))).unwrap_err();
        assert!(matches!(err, Error::Texture(_)));
    }
}
