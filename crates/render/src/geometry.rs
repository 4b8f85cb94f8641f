//! Page geometry and rotation correction
//!
//! Pages carry an intrinsic rotation (0/90/180/270 degrees) independent
//! of the viewer's scale. The coordinator renders with the inverse
//! rotation so the presented page is always upright, and keeps stroke
//! coordinates in the corrected (upright) orientation.

/// Quarter-turn page rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl PageRotation {
    /// Normalize arbitrary degrees to a quarter turn. Non-right-angle
    /// values snap to the nearest lower quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => PageRotation::Deg90,
            2 => PageRotation::Deg180,
            3 => PageRotation::Deg270,
            _ => PageRotation::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            PageRotation::Deg0 => 0,
            PageRotation::Deg90 => 90,
            PageRotation::Deg180 => 180,
            PageRotation::Deg270 => 270,
        }
    }

    /// Rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            PageRotation::Deg0 => PageRotation::Deg0,
            PageRotation::Deg90 => PageRotation::Deg270,
            PageRotation::Deg180 => PageRotation::Deg180,
            PageRotation::Deg270 => PageRotation::Deg90,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn is_sideways(self) -> bool {
        matches!(self, PageRotation::Deg90 | PageRotation::Deg270)
    }
}

/// Intrinsic page geometry as reported by the raster source.
///
/// `width`/`height` are in points (1/72 inch) in the page's raw
/// orientation; `rotation` is the clockwise rotation of that raw
/// content relative to upright presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub rotation: PageRotation,
}

impl PageGeometry {
    pub fn new(width: f32, height: f32, rotation: PageRotation) -> Self {
        Self { width, height, rotation }
    }

    /// Page size in the corrected (upright) orientation.
    pub fn upright_size(&self) -> (f32, f32) {
        if self.rotation.is_sideways() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Rotate a straight-RGBA buffer clockwise by a quarter turn.
///
/// Returns the rotated buffer plus its new width and height. Used to
/// apply a rotation override for backends that hand back rasters in
/// the page's raw orientation.
pub fn rotate_rgba(rgba: &[u8], width: u32, height: u32, rotation: PageRotation) -> (Vec<u8>, u32, u32) {
    debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
    if rotation == PageRotation::Deg0 {
        return (rgba.to_vec(), width, height);
    }

    let (out_width, out_height) = if rotation.is_sideways() { (height, width) } else { (width, height) };
    let mut out = vec![0u8; rgba.len()];

    for y in 0..height {
        for x in 0..width {
            let (tx, ty) = match rotation {
                PageRotation::Deg90 => (height - 1 - y, x),
                PageRotation::Deg180 => (width - 1 - x, height - 1 - y),
                PageRotation::Deg270 => (y, width - 1 - x),
                PageRotation::Deg0 => (x, y),
            };
            let src = ((y * width + x) * 4) as usize;
            let dst = ((ty * out_width + tx) * 4) as usize;
            out[dst..dst + 4].copy_from_slice(&rgba[src..src + 4]);
        }
    }

    (out, out_width, out_height)
}
