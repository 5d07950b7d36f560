use anyhow::{bail, Result};

/// Connected region of high-gradient pixels, a candidate body-outline
/// fragment. Point order is the traversal order and carries no meaning.
#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<(u32, u32)>,
}

/// Axis-aligned bounding box of a contour.
#[derive(Debug, Clone, Copy)]
pub struct ContourBounds {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<ContourBounds> {
        let first = *self.points.first()?;
        let mut bounds = ContourBounds {
            min_x: first.0,
            max_x: first.0,
            min_y: first.1,
            max_y: first.1,
        };
        for &(x, y) in &self.points {
            bounds.min_x = bounds.min_x.min(x);
            bounds.max_x = bounds.max_x.max(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_y = bounds.max_y.max(y);
        }
        Some(bounds)
    }
}

impl ContourBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    /// Height over width. Degenerate (zero-width) boxes report infinity and
    /// fall outside any sane aspect band.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width() == 0 {
            return f64::INFINITY;
        }
        self.height() as f64 / self.width() as f64
    }
}

/// Raster-scan the edge map and flood-fill every unvisited pixel above the
/// threshold into a contour. Each pixel belongs to at most one contour, and
/// only contours with more than `min_points` pixels are kept.
pub fn find_contours(
    edges: &[u8],
    width: usize,
    height: usize,
    threshold: u8,
    min_points: usize,
) -> Result<Vec<Contour>> {
    if edges.len() != width * height {
        bail!(
            "edge map length {} does not match {}x{}",
            edges.len(),
            width,
            height
        );
    }

    let mut contours = Vec::new();
    let mut visited = vec![false; edges.len()];

    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            if !visited[index] && edges[index] > threshold {
                let contour = trace_contour(edges, width, height, x, y, threshold, &mut visited);
                if contour.len() > min_points {
                    contours.push(contour);
                }
            }
        }
    }
    Ok(contours)
}

/// Stack-based 8-connected flood fill from a seed pixel. Explicit stack, so
/// arbitrarily large regions never risk blowing the call stack.
fn trace_contour(
    edges: &[u8],
    width: usize,
    height: usize,
    start_x: usize,
    start_y: usize,
    threshold: u8,
    visited: &mut [bool],
) -> Contour {
    let mut points = Vec::new();
    let mut stack: Vec<(isize, isize)> = vec![(start_x as isize, start_y as isize)];

    while let Some((x, y)) = stack.pop() {
        if x < 0 || x >= width as isize || y < 0 || y >= height as isize {
            continue;
        }
        let index = y as usize * width + x as usize;
        if visited[index] || edges[index] <= threshold {
            continue;
        }

        visited[index] = true;
        points.push((x as u32, y as u32));

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                stack.push((x + dx, y + dy));
            }
        }
    }

    Contour { points }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_map(width: usize, height: usize, bright: &[(usize, usize)]) -> Vec<u8> {
        let mut edges = vec![0u8; width * height];
        for &(x, y) in bright {
            edges[y * width + x] = 200;
        }
        edges
    }

    #[test]
    fn blank_map_yields_no_contours() {
        let contours = find_contours(&vec![0u8; 100], 10, 10, 50, 0).unwrap();
        assert!(contours.is_empty());
    }

    #[test]
    fn contours_below_minimum_size_are_dropped() {
        let edges = edge_map(10, 10, &[(2, 2), (3, 2), (3, 3)]);
        assert!(find_contours(&edges, 10, 10, 50, 100).unwrap().is_empty());
        assert_eq!(find_contours(&edges, 10, 10, 50, 2).unwrap().len(), 1);
    }

    #[test]
    fn diagonal_pixels_join_one_contour() {
        let edges = edge_map(10, 10, &[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let contours = find_contours(&edges, 10, 10, 50, 0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
    }

    #[test]
    fn separated_regions_become_separate_contours() {
        let edges = edge_map(10, 10, &[(1, 1), (2, 1), (7, 7), (8, 7)]);
        let contours = find_contours(&edges, 10, 10, 50, 0).unwrap();
        assert_eq!(contours.len(), 2);
        let total: usize = contours.iter().map(Contour::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn no_pixel_belongs_to_two_contours() {
        // Dense block: every pixel above threshold.
        let edges = vec![200u8; 64];
        let contours = find_contours(&edges, 8, 8, 50, 0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 64);
    }

    #[test]
    fn bounds_and_aspect_ratio() {
        let contour = Contour {
            points: vec![(4, 2), (4, 8), (6, 5)],
        };
        let bounds = contour.bounds().unwrap();
        assert_eq!(bounds.width(), 2);
        assert_eq!(bounds.height(), 6);
        assert!((bounds.aspect_ratio() - 3.0).abs() < 1e-12);
    }
}
