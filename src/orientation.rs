//! Display orientation of a visual track.
//!
//! Containers such as MP4 and MOV store a 2D affine transform alongside each
//! visual track. Cameras that record in portrait typically keep a landscape
//! pixel buffer and set a quarter-turn transform instead of rotating the
//! pixels. This module decodes that transform ([`TransformMatrix`]),
//! classifies it ([`VideoOrientation`]), and bakes it into decoded images
//! ([`PixelTransform`]).
//!
//! Everything here is pure and works without a video file.
//!
//! # Example
//!
//! ```
//! use stillframe::{TransformMatrix, VideoOrientation};
//!
//! // Portrait clip stored as a landscape buffer.
//! let matrix = TransformMatrix::new(0.0, 1.0, -1.0, 0.0);
//! assert_eq!(matrix.orientation(), VideoOrientation::Rotated90);
//! assert_eq!(matrix.display_dimensions(1920, 1080), (1080, 1920));
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use image::DynamicImage;

/// Scale of the 16.16 fixed-point entries in an FFmpeg display matrix.
const FIXED_16_16: f64 = 65536.0;

/// Size in bytes of an FFmpeg display matrix (nine `i32` values).
pub(crate) const DISPLAY_MATRIX_SIZE: usize = 9 * 4;

/// Affine transform attached to a visual track.
///
/// Follows the container convention: a stored pixel at `(x, y)` is displayed
/// at `(a*x + c*y + tx, b*x + d*y + ty)`. Only the `a`, `b`, `c`, `d`
/// coefficients matter for orientation; the translation just moves the
/// result back into the positive quadrant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformMatrix {
    /// The identity transform: pixels are displayed as stored.
    pub const IDENTITY: TransformMatrix = TransformMatrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Build a matrix from its rotation/scale coefficients, with no translation.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a,
            b,
            c,
            d,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Set the translation components.
    #[must_use]
    pub fn with_translation(mut self, tx: f64, ty: f64) -> Self {
        self.tx = tx;
        self.ty = ty;
        self
    }

    /// Decode an FFmpeg display matrix.
    ///
    /// `bytes` holds nine native-endian `i32` values in row-major order
    /// `[a, b, u, c, d, v, tx, ty, w]`, where the affine entries are 16.16
    /// fixed point. Returns `None` when the buffer is too short.
    pub fn from_display_matrix(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DISPLAY_MATRIX_SIZE {
            return None;
        }

        let mut values = [0i32; 9];
        for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let fixed = |raw: i32| raw as f64 / FIXED_16_16;
        Some(Self {
            a: fixed(values[0]),
            b: fixed(values[1]),
            c: fixed(values[3]),
            d: fixed(values[4]),
            tx: fixed(values[6]),
            ty: fixed(values[7]),
        })
    }

    /// Returns `true` for the identity rotation/scale part.
    pub fn is_identity(&self) -> bool {
        self.a == 1.0 && self.b == 0.0 && self.c == 0.0 && self.d == 1.0
    }

    /// Classify the matrix into a [`VideoOrientation`].
    pub fn orientation(&self) -> VideoOrientation {
        VideoOrientation::from_coefficients(self.a, self.b, self.c, self.d)
    }

    /// The pixel operation that turns stored pixels into displayed pixels.
    pub fn pixel_transform(&self) -> PixelTransform {
        PixelTransform::from_matrix(self)
    }

    /// Displayed `(width, height)` for a stored frame of the given size.
    ///
    /// Quarter turns and transposes swap the axes; everything else keeps
    /// them.
    pub fn display_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if self.pixel_transform().swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// The four canonical `[a, b, c, d]` rotations.
const CANONICAL: [([f64; 4], VideoOrientation); 4] = [
    ([1.0, 0.0, 0.0, 1.0], VideoOrientation::Up),
    ([0.0, 1.0, -1.0, 0.0], VideoOrientation::Rotated90),
    ([-1.0, 0.0, 0.0, -1.0], VideoOrientation::Rotated180),
    ([0.0, -1.0, 1.0, 0.0], VideoOrientation::Rotated270),
];

/// Orientation code of a visual track.
///
/// The four variants mirror the four canonical track transforms. The numeric
/// code (see [`code`](VideoOrientation::code)) is stable and is what the
/// command-line tool prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum VideoOrientation {
    /// Identity transform. Also the default for unrecognised transforms.
    #[default]
    Up = 0,
    /// `a=0, b=1, c=-1, d=0`: displayed rotated 90° clockwise.
    Rotated90 = 1,
    /// `a=-1, b=0, c=0, d=-1`: displayed upside down.
    Rotated180 = 2,
    /// `a=0, b=-1, c=1, d=0`: displayed rotated 90° counter-clockwise.
    Rotated270 = 3,
}

impl VideoOrientation {
    /// Classify rotation/scale coefficients.
    ///
    /// Uses exact comparison: authoring tools write these matrices with
    /// integral entries. Anything that is not one of the four canonical
    /// rotations (mirrors, scales, arbitrary angles) yields the default,
    /// [`VideoOrientation::Up`].
    pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64) -> Self {
        CANONICAL
            .iter()
            .find(|(coefficients, _)| *coefficients == [a, b, c, d])
            .map(|(_, orientation)| *orientation)
            .unwrap_or_default()
    }

    /// Numeric orientation code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric orientation code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(VideoOrientation::Up),
            1 => Some(VideoOrientation::Rotated90),
            2 => Some(VideoOrientation::Rotated180),
            3 => Some(VideoOrientation::Rotated270),
            _ => None,
        }
    }

    /// Clockwise rotation in degrees needed for display.
    pub fn degrees(self) -> u16 {
        match self {
            VideoOrientation::Up => 0,
            VideoOrientation::Rotated90 => 90,
            VideoOrientation::Rotated180 => 180,
            VideoOrientation::Rotated270 => 270,
        }
    }

    /// Returns `true` for 90° and 270°.
    pub fn is_quarter_turn(self) -> bool {
        matches!(
            self,
            VideoOrientation::Rotated90 | VideoOrientation::Rotated270
        )
    }
}

impl Display for VideoOrientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            VideoOrientation::Up => "up",
            VideoOrientation::Rotated90 => "rotated-90",
            VideoOrientation::Rotated180 => "rotated-180",
            VideoOrientation::Rotated270 => "rotated-270",
        };
        f.write_str(name)
    }
}

/// A lossless pixel operation from the dihedral group of the square.
///
/// Every axis-aligned track transform (the four rotations and their
/// mirrored counterparts) maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelTransform {
    #[default]
    Identity,
    /// 90° clockwise.
    Rotate90,
    Rotate180,
    /// 90° counter-clockwise.
    Rotate270,
    /// Mirror left/right.
    FlipHorizontal,
    /// Mirror top/bottom.
    FlipVertical,
    /// Mirror across the main diagonal: `(x, y) -> (y, x)`.
    Transpose,
    /// Mirror across the anti-diagonal.
    Transverse,
}

impl PixelTransform {
    /// Derive the pixel operation for a matrix.
    ///
    /// Matrices that are not axis-aligned (arbitrary angles, skews) cannot be
    /// applied losslessly and map to [`PixelTransform::Identity`].
    pub fn from_matrix(matrix: &TransformMatrix) -> Self {
        let sign = |value: f64| {
            if value > 0.0 {
                1
            } else if value < 0.0 {
                -1
            } else {
                0
            }
        };

        match (
            sign(matrix.a),
            sign(matrix.b),
            sign(matrix.c),
            sign(matrix.d),
        ) {
            (1, 0, 0, 1) => PixelTransform::Identity,
            (0, 1, -1, 0) => PixelTransform::Rotate90,
            (-1, 0, 0, -1) => PixelTransform::Rotate180,
            (0, -1, 1, 0) => PixelTransform::Rotate270,
            (-1, 0, 0, 1) => PixelTransform::FlipHorizontal,
            (1, 0, 0, -1) => PixelTransform::FlipVertical,
            (0, 1, 1, 0) => PixelTransform::Transpose,
            (0, -1, -1, 0) => PixelTransform::Transverse,
            _ => {
                log::warn!(
                    "Track transform [{} {} {} {}] is not axis-aligned; leaving pixels as stored",
                    matrix.a,
                    matrix.b,
                    matrix.c,
                    matrix.d,
                );
                PixelTransform::Identity
            }
        }
    }

    /// Returns `true` if the operation swaps width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            PixelTransform::Rotate90
                | PixelTransform::Rotate270
                | PixelTransform::Transpose
                | PixelTransform::Transverse
        )
    }

    /// Apply the operation to an image.
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            PixelTransform::Identity => image,
            PixelTransform::Rotate90 => image.rotate90(),
            PixelTransform::Rotate180 => image.rotate180(),
            PixelTransform::Rotate270 => image.rotate270(),
            PixelTransform::FlipHorizontal => image.fliph(),
            PixelTransform::FlipVertical => image.flipv(),
            PixelTransform::Transpose => image.rotate90().fliph(),
            PixelTransform::Transverse => image.rotate90().flipv(),
        }
    }
}
