use anyhow::{anyhow, Result};

/// Packed 8-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Parses `#rgb` and `#rrggbb` notations.
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.is_ascii())
            .ok_or_else(|| anyhow!("colour must be '#' plus hex digits: {s:?}"))?;

        let channel = |v: &str| u8::from_str_radix(v, 16);
        match hex.len() {
            3 => Ok(Rgb(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            6 => Ok(Rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(anyhow!("colour must be #rgb or #rrggbb: {s:?}")),
        }
    }
}

/// The drawing collaborator supplied from outside the core. Logical ("CSS")
/// size and backing-store ("physical") size differ by the device pixel ratio;
/// the renderer resizes the backing store each redraw so output stays sharp
/// on high-density displays.
///
/// All drawing coordinates are in physical pixels.
pub trait DrawSurface {
    /// Displayed size in logical pixels.
    fn css_size(&self) -> (f64, f64);

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64;

    fn backing_size(&self) -> (u32, u32);

    fn resize_backing(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb);

    /// Fills a closed polygon (last point joins back to the first).
    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgb);
}

/// Lets a caller keep a probing handle on a surface that has been handed to
/// the renderer.
impl<S: DrawSurface> DrawSurface for std::rc::Rc<std::cell::RefCell<S>> {
    fn css_size(&self) -> (f64, f64) {
        self.borrow().css_size()
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.borrow().device_pixel_ratio()
    }

    fn backing_size(&self) -> (u32, u32) {
        self.borrow().backing_size()
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        self.borrow_mut().resize_backing(width, height)
    }

    fn clear(&mut self) {
        self.borrow_mut().clear()
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        self.borrow_mut().fill_rect(x, y, width, height, color)
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgb) {
        self.borrow_mut().fill_polygon(points, color)
    }
}

/// In-memory framebuffer surface. Serves both as the default headless
/// implementation and as the probe that lets tests assert on actual pixels.
pub struct PixelSurface {
    css_width: f64,
    css_height: f64,
    dpr: f64,
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
    background: Rgb,
}

impl PixelSurface {
    pub fn new(css_width: f64, css_height: f64, dpr: f64) -> Self {
        let mut surface = PixelSurface {
            css_width,
            css_height,
            dpr,
            width: 0,
            height: 0,
            pixels: Vec::new(),
            background: Rgb::BLACK,
        };
        surface.resize_backing(css_width as u32, css_height as u32);
        surface
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Counts pixels of the given colour in one column, for test probes.
    pub fn column_count(&self, x: u32, color: Rgb) -> usize {
        (0..self.height)
            .filter(|&y| self.pixel(x, y) == Some(color))
            .count()
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = color;
    }
}

impl DrawSurface for PixelSurface {
    fn css_size(&self) -> (f64, f64) {
        (self.css_width, self.css_height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.pixels = vec![self.background; (self.width * self.height) as usize];
    }

    fn clear(&mut self) {
        self.pixels.fill(self.background);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let x1 = (x + width).ceil() as i64;
        let y1 = (y + height).ceil() as i64;

        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color);
            }
        }
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgb) {
        if points.len() < 3 {
            return;
        }

        // Even-odd scanline fill, sampling each row at its centre.
        for py in 0..self.height {
            let scan_y = py as f64 + 0.5;
            let mut crossings = Vec::new();

            for i in 0..points.len() {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % points.len()];
                if (y0 <= scan_y) == (y1 <= scan_y) {
                    continue;
                }
                crossings.push(x0 + (scan_y - y0) / (y1 - y0) * (x1 - x0));
            }

            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let from = pair[0].round() as i64;
                let to = pair[1].round() as i64;
                for px in from..to {
                    self.put(px, py as i64, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgb = Rgb(10, 20, 30);

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Rgb::parse("#039").unwrap(), Rgb(0x00, 0x33, 0x99));
        assert_eq!(Rgb::parse("#aaff00").unwrap(), Rgb(0xaa, 0xff, 0x00));
        assert!(Rgb::parse("039").is_err());
        assert!(Rgb::parse("#03").is_err());
        assert!(Rgb::parse("#gg0000").is_err());
    }

    #[test]
    fn rect_fill_is_clipped_to_bounds() {
        let mut surface = PixelSurface::new(10.0, 10.0, 1.0);
        surface.fill_rect(-5.0, -5.0, 100.0, 100.0, INK);
        assert_eq!(surface.pixel(0, 0), Some(INK));
        assert_eq!(surface.pixel(9, 9), Some(INK));
    }

    #[test]
    fn polygon_fills_a_triangle_interior() {
        let mut surface = PixelSurface::new(20.0, 20.0, 1.0);
        surface.fill_polygon(&[(0.0, 20.0), (10.0, 0.0), (20.0, 20.0)], INK);

        // Bottom centre is inside, top corners are not.
        assert_eq!(surface.pixel(10, 18), Some(INK));
        assert_eq!(surface.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(surface.pixel(19, 0), Some(Rgb::BLACK));
    }

    #[test]
    fn resize_clears_the_backing_store() {
        let mut surface = PixelSurface::new(8.0, 8.0, 1.0);
        surface.fill_rect(0.0, 0.0, 8.0, 8.0, INK);
        surface.resize_backing(16, 16);

        assert_eq!(surface.backing_size(), (16, 16));
        assert_eq!(surface.pixel(4, 4), Some(Rgb::BLACK));
    }
}
