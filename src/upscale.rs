use macroquad::texture::Image;

/// Largest edge, in pixels, a backend image can have.
pub const MAX_IMAGE_DIMENSION: u32 = u16::MAX as u32;

const BYTES_PER_PIXEL: usize = 4;

/// Nearest-neighbour magnification by an integer factor.
///
/// Source pixel `(x, y)` becomes the block `[x*s, (x+1)*s) x [y*s, (y+1)*s)`
/// with exactly the same RGBA bytes. No filtering of any kind.
///
/// Returns `None` for `scale == 0`, for a result larger than
/// [`MAX_IMAGE_DIMENSION`] on either edge, or for an empty image or one whose
/// byte buffer does not match its dimensions.
pub fn nearest_neighbor(source: &Image, scale: u32) -> Option<Image> {
    if scale == 0 {
        return None;
    }

    let width = source.width as usize;
    let height = source.height as usize;
    if width == 0 || height == 0 || source.bytes.len() != width * height * BYTES_PER_PIXEL {
        return None;
    }

    let out_width = u16::try_from((source.width as u32).checked_mul(scale)?).ok()?;
    let out_height = u16::try_from((source.height as u32).checked_mul(scale)?).ok()?;

    let scale = scale as usize;
    let row_len = out_width as usize * BYTES_PER_PIXEL;
    let mut bytes = Vec::with_capacity(row_len * out_height as usize);

    for src_row in source.bytes.chunks_exact(width * BYTES_PER_PIXEL) {
        let row_start = bytes.len();
        for pixel in src_row.chunks_exact(BYTES_PER_PIXEL) {
            for _ in 0..scale {
                bytes.extend_from_slice(pixel);
            }
        }
        // the remaining rows of the block repeat the one just written
        for _ in 1..scale {
            bytes.extend_from_within(row_start..row_start + row_len);
        }
    }

    Some(Image {
        bytes,
        width: out_width,
        height: out_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u16, height: u16, pixels: &[[u8; 4]]) -> Image {
        Image {
            bytes: pixels.concat(),
            width,
            height,
        }
    }

    fn pixel(img: &Image, x: usize, y: usize) -> [u8; 4] {
        let i = (y * img.width as usize + x) * 4;
        [img.bytes[i], img.bytes[i + 1], img.bytes[i + 2], img.bytes[i + 3]]
    }

    #[test]
    fn single_pixel_becomes_solid_block() {
        let red = [255, 0, 0, 255];
        let out = nearest_neighbor(&image(1, 1, &[red]), 3).unwrap();
        assert_eq!((out.width, out.height), (3, 3));
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(pixel(&out, x, y), red);
            }
        }
    }

    #[test]
    fn every_pixel_maps_to_its_own_block() {
        let a = [1, 2, 3, 255];
        let b = [4, 5, 6, 128];
        let c = [7, 8, 9, 0];
        let d = [10, 11, 12, 64];
        let src = image(2, 2, &[a, b, c, d]);
        let out = nearest_neighbor(&src, 2).unwrap();
        assert_eq!((out.width, out.height), (4, 4));

        let expected = [[a, a, b, b], [a, a, b, b], [c, c, d, d], [c, c, d, d]];
        for (y, row) in expected.iter().enumerate() {
            for (x, want) in row.iter().enumerate() {
                assert_eq!(pixel(&out, x, y), *want, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn non_square_source_keeps_aspect() {
        let px = [9, 9, 9, 9];
        let out = nearest_neighbor(&image(3, 1, &[px, px, px]), 4).unwrap();
        assert_eq!((out.width, out.height), (12, 4));
        assert_eq!(out.bytes.len(), 12 * 4 * 4);
    }

    #[test]
    fn scale_one_is_a_copy() {
        let src = image(2, 1, &[[1, 1, 1, 1], [2, 2, 2, 2]]);
        let out = nearest_neighbor(&src, 1).unwrap();
        assert_eq!(out.bytes, src.bytes);
    }

    #[test]
    fn rejects_zero_and_oversized_scales() {
        let src = image(1, 1, &[[0, 0, 0, 255]]);
        assert!(nearest_neighbor(&src, 0).is_none());
        assert!(nearest_neighbor(&src, MAX_IMAGE_DIMENSION + 1).is_none());
    }

    #[test]
    fn rejects_inconsistent_buffer() {
        let broken = Image {
            bytes: vec![0; 3],
            width: 1,
            height: 1,
        };
        assert!(nearest_neighbor(&broken, 2).is_none());
    }
}
