//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Label rasters use unsigned integers, spectral bands use floats; both go
/// through the same `Raster<T>` container and GeoTIFF codec.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value used to fill cells that cannot be decoded
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert from f64, falling back to `default_nodata` when out of range
    fn from_f64_or_nodata(value: f64) -> Self {
        NumCast::from(value).unwrap_or_else(Self::default_nodata)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                0
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                matches!(nodata, Some(nd) if *self == nd)
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    };
}

impl_raster_element_int!(u8);
impl_raster_element_int!(u16);
impl_raster_element_int!(u32);
impl_raster_element_int!(i32);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_nodata_is_background() {
        assert_eq!(u32::default_nodata(), 0);
        assert!(5u32.is_nodata(Some(5)));
        assert!(!5u32.is_nodata(None));
    }

    #[test]
    fn test_float_nan_is_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!((-9999.0_f64).is_nodata(Some(-9999.0)));
        assert!(!1.0_f64.is_nodata(Some(-9999.0)));
    }

    #[test]
    fn test_from_f64_out_of_range() {
        assert_eq!(u32::from_f64_or_nodata(-1.0), 0);
        assert_eq!(u32::from_f64_or_nodata(42.0), 42);
        assert!(f32::from_f64_or_nodata(f64::NAN).is_nan());
    }
}
