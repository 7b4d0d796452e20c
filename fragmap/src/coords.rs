//! Provides utilities related to coordinates.

use std::{
    collections::BTreeSet,
    fmt,
    fmt::{Display, Formatter},
    str::FromStr,
};

use geo_types::{coord, Coord, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::SignificantlyDifferent;

/// Size of the whole world in world coordinates at zoom level 0.
pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: usize = 24;

/// Longitude and latitude bounds of the geographic plane which is subdivided by quadkeys.
pub const EARTH_LON_MIN: f64 = -180.0;
pub const EARTH_LON_MAX: f64 = 180.0;
pub const EARTH_LAT_MIN: f64 = -90.0;
pub const EARTH_LAT_MAX: f64 = 90.0;

#[derive(
    Ord, PartialOrd, Eq, PartialEq, Hash, Copy, Clone, Debug, Default, Serialize, Deserialize,
)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    pub const fn new(z: u8) -> Self {
        ZoomLevel(z)
    }

    /// The deepest level a [`Quadkey`] can address.
    pub const MAX: ZoomLevel = ZoomLevel(MAX_ZOOM as u8);

    /// This level, capped at [`ZoomLevel::MAX`].
    pub fn clamped(self) -> Self {
        self.min(Self::MAX)
    }

    /// The factor which scales world coordinates to screen coordinates at this level.
    pub fn scale(self) -> f64 {
        2.0_f64.powi(self.0 as i32)
    }
}

impl Display for ZoomLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ZoomLevel {
    fn from(zoom_level: u8) -> Self {
        ZoomLevel(zoom_level)
    }
}

impl From<ZoomLevel> for u8 {
    fn from(val: ZoomLevel) -> Self {
        val.0
    }
}

/// Represents the position of a node within a quad tree. The length of the key is the
/// [`ZoomLevel`] of the node. Each digit selects one quadrant of the subdivision above it:
/// `0` north west, `1` north east, `2` south west, `3` south east.
///
/// Keys are ordered by zoom level first and then by path.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone, Copy)]
pub struct Quadkey {
    len: u8,
    digits: [u8; MAX_ZOOM],
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuadkeyParseError {
    #[error("quadkey digit `{0}` is not one of 0, 1, 2 or 3")]
    InvalidDigit(char),
    #[error("quadkey is deeper than the maximum zoom level")]
    TooDeep,
}

impl Quadkey {
    /// The root of the quad tree which covers the whole plane.
    pub const ROOT: Quadkey = Quadkey {
        len: 0,
        digits: [0; MAX_ZOOM],
    };

    pub fn new(quad_encoded: &[u8]) -> Self {
        assert!(quad_encoded.len() <= MAX_ZOOM, "quadkey is too deep");
        let mut digits = [0; MAX_ZOOM];
        for (i, part) in quad_encoded.iter().enumerate() {
            assert!(*part < 4, "quadkey digit out of range: {part}");
            digits[i] = *part;
        }
        Self {
            len: quad_encoded.len() as u8,
            digits,
        }
    }

    /// Builds the key of the tile `x`/`y` at `zoom`. The tile `y` axis points south. For levels
    /// deeper than [`ZoomLevel::MAX`] the ancestor at that level is returned.
    pub fn from_tile(x: u32, y: u32, zoom: ZoomLevel) -> Self {
        let shift = u32::from(u8::from(zoom).saturating_sub(MAX_ZOOM as u8));
        let x = x.checked_shr(shift).unwrap_or(0);
        let y = y.checked_shr(shift).unwrap_or(0);

        let mut digits = [0; MAX_ZOOM];
        let z = u8::from(zoom.clamped()) as usize;
        for (i, digit) in digits.iter_mut().take(z).enumerate() {
            let mask = 1 << (z - 1 - i);
            let mut value = 0;
            if x & mask != 0 {
                value += 1;
            }
            if y & mask != 0 {
                value += 2;
            }
            *digit = value;
        }
        Self {
            len: z as u8,
            digits,
        }
    }

    pub fn zoom_level(&self) -> ZoomLevel {
        ZoomLevel(self.len)
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits[..self.len as usize]
    }

    pub fn parent(&self) -> Option<Quadkey> {
        if self.len == 0 {
            return None;
        }
        let mut parent = *self;
        parent.len -= 1;
        parent.digits[parent.len as usize] = 0;
        Some(parent)
    }

    pub fn children(&self) -> Option<[Quadkey; 4]> {
        if self.len as usize >= MAX_ZOOM {
            return None;
        }
        let mut children = [*self; 4];
        for (i, child) in children.iter_mut().enumerate() {
            child.digits[self.len as usize] = i as u8;
            child.len += 1;
        }
        Some(children)
    }

    /// Tile coordinates of this key at its zoom level.
    pub fn tile(&self) -> (u32, u32) {
        self.digits().iter().fold((0, 0), |(x, y), digit| {
            ((x << 1) | (*digit as u32 & 1), (y << 1) | (*digit as u32 >> 1))
        })
    }

    /// The geographic rectangle covered by this key.
    pub fn lon_lat_rect(&self) -> Rect<f64> {
        let (x, y) = self.tile();
        let count = 2.0_f64.powi(self.len as i32);
        let width = (EARTH_LON_MAX - EARTH_LON_MIN) / count;
        let height = (EARTH_LAT_MAX - EARTH_LAT_MIN) / count;

        let lon_min = EARTH_LON_MIN + x as f64 * width;
        let lat_max = EARTH_LAT_MAX - y as f64 * height;
        Rect::new(
            coord! { x: lon_min, y: lat_max - height },
            coord! { x: lon_min + width, y: lat_max },
        )
    }

    /// Calculates all keys at `zoom` whose rectangles overlap the geographic `rect`. Levels
    /// deeper than [`ZoomLevel::MAX`] are capped.
    pub fn covering(rect: &Rect<f64>, zoom: ZoomLevel) -> BTreeSet<Quadkey> {
        let zoom = zoom.clamped();
        let count = 1u32 << u8::from(zoom);

        let tile_num = |value: f64, min: f64, max: f64| -> u32 {
            let position = ((value - min) / (max - min) * count as f64).floor();
            position.clamp(0.0, (count - 1) as f64) as u32
        };

        let x_min = tile_num(rect.min().x, EARTH_LON_MIN, EARTH_LON_MAX);
        let x_max = tile_num(rect.max().x, EARTH_LON_MIN, EARTH_LON_MAX);
        // Tile rows grow southwards, so the northern edge gives the first row.
        let y_min = tile_num(-rect.max().y, -EARTH_LAT_MAX, -EARTH_LAT_MIN);
        let y_max = tile_num(-rect.min().y, -EARTH_LAT_MAX, -EARTH_LAT_MIN);

        let mut keys = BTreeSet::new();
        for x in x_min..=x_max {
            for y in y_min..=y_max {
                keys.insert(Quadkey::from_tile(x, y, zoom));
            }
        }
        keys
    }
}

impl Default for Quadkey {
    fn default() -> Self {
        Self::ROOT
    }
}

impl FromStr for Quadkey {
    type Err = QuadkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_ZOOM {
            return Err(QuadkeyParseError::TooDeep);
        }
        let digits = s
            .chars()
            .map(|c| match c {
                '0'..='3' => Ok(c as u8 - b'0'),
                _ => Err(QuadkeyParseError::InvalidDigit(c)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Quadkey::new(&digits))
    }
}

impl fmt::Debug for Quadkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Q({self})")
    }
}

impl Display for Quadkey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for part in self.digits() {
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl Serialize for Quadkey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quadkey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `Zoom` is the continuous zoom of the camera. While zooming the camera passes fractional
/// values; the [`ZoomLevel`] is derived by flooring.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Zoom(f64);

impl Zoom {
    pub fn new(zoom: f64) -> Self {
        Zoom(zoom)
    }

    pub fn level(&self) -> ZoomLevel {
        ZoomLevel::from(self.0.max(0.0).floor() as u8)
    }

    /// True if the camera rests exactly on a zoom level.
    pub fn is_integer(&self) -> bool {
        self.0.fract() == 0.0
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Display for Zoom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", (self.0 * 100.0).round() / 100.0)
    }
}

impl SignificantlyDifferent for Zoom {
    type Epsilon = f64;

    fn ne(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        (self.0 - other.0).abs() > epsilon
    }
}

/// Inflates `rect` on each side by `fraction` of its width and height.
pub fn inflate(rect: &Rect<f64>, fraction: f64) -> Rect<f64> {
    let dx = rect.width() * fraction;
    let dy = rect.height() * fraction;
    Rect::new(
        coord! { x: rect.min().x - dx, y: rect.min().y - dy },
        coord! { x: rect.max().x + dx, y: rect.max().y + dy },
    )
}

/// Bounding rectangle of a point set, `None` if it is empty.
pub fn bounds_from_coords<'a>(
    coords: impl IntoIterator<Item = &'a Coord<f64>>,
) -> Option<Rect<f64>> {
    let mut iter = coords.into_iter();
    let first = *iter.next()?;
    let (min, max) = iter.fold((first, first), |(min, max), c| {
        (
            coord! { x: min.x.min(c.x), y: min.y.min(c.y) },
            coord! { x: max.x.max(c.x), y: max.y.max(c.y) },
        )
    });
    Some(Rect::new(min, max))
}

#[cfg(test)]
mod tests {
    use geo_types::{coord, Rect};

    use crate::coords::{Quadkey, QuadkeyParseError, Zoom, ZoomLevel, MAX_ZOOM};

    #[test]
    fn test_quad_key_parse() {
        let key: Quadkey = "0123".parse().unwrap();
        assert_eq!(key.digits(), &[0, 1, 2, 3]);
        assert_eq!(key.zoom_level(), ZoomLevel::new(4));
        assert_eq!(key.to_string(), "0123");
        assert_eq!(
            "014".parse::<Quadkey>(),
            Err(QuadkeyParseError::InvalidDigit('4'))
        );
        assert_eq!("".parse::<Quadkey>().unwrap(), Quadkey::ROOT);
    }

    #[test]
    fn test_quad_key_tile() {
        assert_eq!(Quadkey::from_tile(0, 0, ZoomLevel::new(1)).to_string(), "0");
        assert_eq!(Quadkey::from_tile(1, 0, ZoomLevel::new(1)).to_string(), "1");
        assert_eq!(Quadkey::from_tile(0, 1, ZoomLevel::new(1)).to_string(), "2");
        assert_eq!(Quadkey::from_tile(1, 1, ZoomLevel::new(1)).to_string(), "3");
        assert_eq!(Quadkey::from_tile(3, 5, ZoomLevel::new(3)).to_string(), "213");
        assert_eq!("213".parse::<Quadkey>().unwrap().tile(), (3, 5));
    }

    #[test]
    fn test_quad_key_hierarchy() {
        let key: Quadkey = "21".parse().unwrap();
        assert_eq!(key.parent().unwrap().to_string(), "2");
        assert_eq!(Quadkey::ROOT.parent(), None);
        let children = key.children().unwrap();
        assert_eq!(children[3].to_string(), "213");
        assert_eq!(children[0].parent(), Some(key));
    }

    #[test]
    fn test_quad_key_order() {
        let a: Quadkey = "3".parse().unwrap();
        let b: Quadkey = "00".parse().unwrap();
        let c: Quadkey = "01".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_lon_lat_rect() {
        let rect = "0".parse::<Quadkey>().unwrap().lon_lat_rect();
        assert_eq!(rect.min(), coord! { x: -180.0, y: 0.0 });
        assert_eq!(rect.max(), coord! { x: 0.0, y: 90.0 });

        let rect = "3".parse::<Quadkey>().unwrap().lon_lat_rect();
        assert_eq!(rect.min(), coord! { x: 0.0, y: -90.0 });
        assert_eq!(rect.max(), coord! { x: 180.0, y: 0.0 });
    }

    #[test]
    fn test_covering() {
        let rect = Rect::new(coord! { x: -10.0, y: -10.0 }, coord! { x: 10.0, y: 10.0 });
        let keys = Quadkey::covering(&rect, ZoomLevel::new(1));
        assert_eq!(keys.len(), 4);

        let rect = Rect::new(coord! { x: 10.0, y: 10.0 }, coord! { x: 20.0, y: 20.0 });
        let keys = Quadkey::covering(&rect, ZoomLevel::new(2));
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        assert_eq!(keys, vec!["12".to_string()]);
    }

    #[test]
    fn test_covering_beyond_max_zoom() {
        let rect = Rect::new(coord! { x: 11.5, y: 48.1 }, coord! { x: 11.5, y: 48.1 });
        let keys = Quadkey::covering(&rect, ZoomLevel::new(40));
        assert_eq!(keys.len(), 1);
        let key = keys.iter().next().unwrap();
        assert_eq!(key.zoom_level(), ZoomLevel::MAX);
        assert_eq!(key.digits().len(), MAX_ZOOM);

        // Tile 2^26 - 1 at level 26 lies in the last column, so does its ancestor.
        let deep = Quadkey::from_tile((1 << 26) - 1, 4, ZoomLevel::new(26));
        assert_eq!(deep.zoom_level(), ZoomLevel::MAX);
        assert_eq!(deep.tile(), ((1 << MAX_ZOOM) - 1, 1));
    }

    #[test]
    fn test_zoom() {
        assert!(Zoom::new(3.0).is_integer());
        assert!(!Zoom::new(3.5).is_integer());
        assert_eq!(Zoom::new(3.7).level(), ZoomLevel::new(3));
        assert_eq!(ZoomLevel::new(3).scale(), 8.0);
    }
}
