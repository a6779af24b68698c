use std::io::Cursor;

use image::{ColorType, ImageFormat, ImageReader};
use pdf_writer::{Filter, Pdf, Ref};
use thiserror::Error;

/// Anything that can go wrong between an image reference and decoded pixels.
/// Never leaves the renderer: see [`acquire`].
#[derive(Error, Debug)]
pub(crate) enum ImageLoadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

enum PixelData {
    /// Baseline JPEG passed through untouched (DCTDecode).
    Jpeg { data: Vec<u8>, gray: bool },
    /// Zlib-compressed RGB plus an optional soft mask for transparency.
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

pub(crate) struct LoadedImage {
    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,
    data: PixelData,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .finish_non_exhaustive()
    }
}

pub(crate) fn decode(bytes: Vec<u8>) -> Result<LoadedImage, ImageLoadError> {
    let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
    let format = reader.format();
    let decoded = reader.decode()?;
    let (w, h) = (decoded.width(), decoded.height());
    if w == 0 || h == 0 {
        return Err(ImageLoadError::Empty);
    }

    // Pass a JPEG through only when its frame really has the component count
    // the colour space claims; CMYK/YCCK frames decode to Rgb8 too.
    let components = match format {
        Some(ImageFormat::Jpeg) => jpeg_components(&bytes),
        _ => None,
    };
    let data = match (components, decoded.color()) {
        (Some(3), ColorType::Rgb8) => PixelData::Jpeg { data: bytes, gray: false },
        (Some(1), ColorType::L8) => PixelData::Jpeg { data: bytes, gray: true },
        _ => {
            let rgba = decoded.to_rgba8();
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let rgb_data: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let alpha = has_alpha.then(|| {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6)
            });
            PixelData::Flate {
                rgb: miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6),
                alpha,
            }
        }
    };

    Ok(LoadedImage {
        pixel_width: w,
        pixel_height: h,
        data,
    })
}

/// Component count from the first SOF segment of a JPEG stream.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    loop {
        while *data.get(pos)? != 0xFF {
            pos += 1;
        }
        while *data.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *data.get(pos)?;
        pos += 1;
        if matches!(marker, 0x01 | 0xD0..=0xD7) {
            continue;
        }
        if marker == 0xD9 || marker == 0xDA {
            return None;
        }
        let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            // length(2) precision(1) height(2) width(2) components(1)
            return data.get(pos + 7).copied();
        }
        pos += len;
    }
}

/// Scoped image acquisition: fetch and decode, and on any failure log it and
/// hand back `None` so the caller falls back to its image-less rendering.
pub(crate) fn acquire(
    what: &str,
    fetch: impl FnOnce() -> std::io::Result<Vec<u8>>,
) -> Option<LoadedImage> {
    let result = fetch().map_err(ImageLoadError::from).and_then(decode);
    match result {
        Ok(img) => {
            log::debug!("{what}: loaded {}x{}", img.pixel_width, img.pixel_height);
            Some(img)
        }
        Err(ImageLoadError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("{what}: not found, rendering without it");
            None
        }
        Err(e) => {
            log::warn!("{what}: {e}; rendering without it");
            None
        }
    }
}

/// Write the image (and its soft mask) as XObjects.
pub(crate) fn embed(pdf: &mut Pdf, img: &LoadedImage, alloc: &mut impl FnMut() -> Ref) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.pixel_width as i32, img.pixel_height as i32);

    match &img.data {
        PixelData::Jpeg { data, gray } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        PixelData::Flate { rgb, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let mut xobj = pdf.image_xobject(xobj_ref, rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }

    xobj_ref
}
