use anyhow::{bail, Result};

const SOBEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
const SOBEL_Y: [i32; 9] = [-1, -2, -1, 0, 0, 0, 1, 2, 1];

/// ITU-R BT.601 luma conversion. Output length is input length / 3.
pub fn to_grayscale(pixels: &[u8]) -> Result<Vec<u8>> {
    if pixels.len() % 3 != 0 {
        bail!("RGB buffer length {} is not a multiple of 3", pixels.len());
    }

    let mut grayscale = Vec::with_capacity(pixels.len() / 3);
    for rgb in pixels.chunks_exact(3) {
        let gray = 0.299 * rgb[0] as f64 + 0.587 * rgb[1] as f64 + 0.114 * rgb[2] as f64;
        grayscale.push(gray.round() as u8);
    }
    Ok(grayscale)
}

/// 3x3 Sobel gradient magnitude, computed for interior pixels only; the
/// 1-pixel border stays zero. Magnitudes are clamped to 255.
pub fn sobel_magnitudes(grayscale: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    if grayscale.len() != width * height {
        bail!(
            "grayscale buffer length {} does not match {}x{}",
            grayscale.len(),
            width,
            height
        );
    }

    let mut edges = vec![0u8; grayscale.len()];
    if width < 3 || height < 3 {
        return Ok(edges);
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx = 0i32;
            let mut gy = 0i32;
            for ky in 0..3 {
                for kx in 0..3 {
                    let pixel = grayscale[(y + ky - 1) * width + (x + kx - 1)] as i32;
                    gx += pixel * SOBEL_X[ky * 3 + kx];
                    gy += pixel * SOBEL_Y[ky * 3 + kx];
                }
            }
            let magnitude = ((gx * gx + gy * gy) as f64).sqrt();
            edges[y * width + x] = magnitude.min(255.0) as u8;
        }
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_of_black_is_all_zero() {
        let gray = to_grayscale(&[0; 12]).unwrap();
        assert_eq!(gray, vec![0; 4]);
    }

    #[test]
    fn grayscale_weights_channels() {
        // Pure red, green, blue pixels.
        let gray = to_grayscale(&[255, 0, 0, 0, 255, 0, 0, 0, 255]).unwrap();
        assert_eq!(gray, vec![76, 150, 29]);
    }

    #[test]
    fn grayscale_rejects_ragged_buffer() {
        assert!(to_grayscale(&[1, 2]).is_err());
    }

    #[test]
    fn sobel_of_uniform_image_is_zero() {
        let gray = vec![128u8; 25];
        let edges = sobel_magnitudes(&gray, 5, 5).unwrap();
        assert!(edges.iter().all(|&e| e == 0));
    }

    #[test]
    fn sobel_border_stays_zero() {
        // Vertical step edge down the middle of a 6x5 image.
        let mut gray = vec![0u8; 30];
        for y in 0..5 {
            for x in 3..6 {
                gray[y * 6 + x] = 255;
            }
        }
        let edges = sobel_magnitudes(&gray, 6, 5).unwrap();
        for x in 0..6 {
            assert_eq!(edges[x], 0);
            assert_eq!(edges[4 * 6 + x], 0);
        }
        for y in 0..5 {
            assert_eq!(edges[y * 6], 0);
            assert_eq!(edges[y * 6 + 5], 0);
        }
        // The step itself must register a strong clamped response.
        assert_eq!(edges[2 * 6 + 2], 255);
    }
}
