//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Georeferencing is carried by the ModelPixelScale
//! and ModelTiepoint tags; projections are not interpreted.
//!
//! Float rasters are written as 32-bit float, label rasters as 32-bit
//! unsigned integers so large label ids survive the round trip exactly.

use crate::error::{Error, Result};
use crate::raster::{BandStack, GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32, Gray32Float};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tiff::ColorType;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;

/// Read one band of a GeoTIFF file into a Raster
///
/// # Arguments
/// * `path` - Path to the GeoTIFF file
/// * `band` - Band number (1-indexed) for multi-sample files, defaults to 1
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_band(file, band)
}

/// Read one band of a GeoTIFF held in memory
pub fn read_geotiff_from_buffer<T>(data: &[u8], band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_band(Cursor::new(data), band)
}

/// Read a spectral stack.
///
/// A single path is read with all of its samples as bands; several paths
/// are read as one band each and must share dimensions.
pub fn read_band_stack<P: AsRef<Path>>(paths: &[P]) -> Result<BandStack> {
    match paths {
        [] => Err(Error::Algorithm("No band files given".into())),
        [single] => {
            let file = File::open(single)?;
            let decoded = decode(file)?;
            let mut stack =
                BandStack::from_interleaved(&decoded.values, decoded.samples, decoded.rows, decoded.cols)?;
            if let Some(gt) = decoded.transform {
                stack.set_transform(gt);
            }
            Ok(stack)
        }
        many => {
            let bands = many
                .iter()
                .map(|p| read_geotiff::<f64, _>(p, None))
                .collect::<Result<Vec<_>>>()?;
            BandStack::from_rasters(&bands)
        }
    }
}

/// Decoded image: interleaved samples plus georeferencing
struct Decoded {
    values: Vec<f64>,
    samples: usize,
    rows: usize,
    cols: usize,
    transform: Option<GeoTransform>,
}

fn samples_per_pixel(color: ColorType) -> Result<usize> {
    match color {
        ColorType::Gray(_) => Ok(1),
        ColorType::GrayA(_) => Ok(2),
        ColorType::RGB(_) | ColorType::YCbCr(_) => Ok(3),
        ColorType::RGBA(_) | ColorType::CMYK(_) => Ok(4),
        other => Err(Error::UnsupportedDataType(format!("TIFF color type {:?}", other))),
    }
}

fn to_f64_vec(result: DecodingResult) -> Result<Vec<f64>> {
    let values = match result {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };
    Ok(values)
}

fn decode<R: Read + Seek>(reader: R) -> Result<Decoded> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let (rows, cols) = (height as usize, width as usize);

    let color = decoder
        .colortype()
        .map_err(|e| Error::Other(format!("Cannot read color type: {}", e)))?;
    let samples = samples_per_pixel(color)?;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;
    let values = to_f64_vec(result)?;

    if values.len() != rows * cols * samples {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let transform = read_geotransform(&mut decoder);

    Ok(Decoded {
        values,
        samples,
        rows,
        cols,
        transform,
    })
}

fn decode_band<T, R>(reader: R, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let decoded = decode(reader)?;
    let band = band.unwrap_or(1);
    if band == 0 || band > decoded.samples {
        return Err(Error::BandCountMismatch {
            expected: band,
            actual: decoded.samples,
        });
    }

    let data: Vec<T> = decoded
        .values
        .iter()
        .skip(band - 1)
        .step_by(decoded.samples)
        .map(|&v| T::from_f64_or_nodata(v))
        .collect();

    let mut raster = Raster::from_vec(data, decoded.rows, decoded.cols)?;
    if let Some(gt) = decoded.transform {
        raster.set_transform(gt);
    }
    Ok(raster)
}

/// GeoTransform from ModelPixelScale + ModelTiepoint, if both are present
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE_TAG)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT_TAG)).ok()?;
    GeoTransform::from_tiepoint(&scale, &tiepoint)
}

/// Write a Raster to a 32-bit float GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_float(raster, file)
}

/// Write a Raster to an in-memory 32-bit float GeoTIFF
pub fn write_geotiff_to_buffer<T: RasterElement>(raster: &Raster<T>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_float(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Write a label raster to a 32-bit unsigned integer GeoTIFF file
pub fn write_label_geotiff<P: AsRef<Path>>(labels: &Raster<u32>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_labels(labels, file)
}

/// Write a label raster to an in-memory 32-bit unsigned integer GeoTIFF
pub fn write_label_geotiff_to_buffer(labels: &Raster<u32>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_labels(labels, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_float<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
    write_geo_tags(image.encoder(), raster.transform())?;
    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

fn encode_labels<W: Write + Seek>(labels: &Raster<u32>, writer: W) -> Result<()> {
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;
    let (rows, cols) = labels.shape();
    let data: Vec<u32> = labels.data().iter().copied().collect();

    let mut image = encoder
        .new_image::<Gray32>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
    write_geo_tags(image.encoder(), labels.transform())?;
    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

fn write_geo_tags<W, K>(dir: &mut DirectoryEncoder<'_, W, K>, gt: &GeoTransform) -> Result<()>
where
    W: Write + Seek,
    K: TiffKind,
{
    let scale = gt.pixel_scale();
    dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE_TAG), &scale[..])
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = gt.tiepoint();
    dir.write_tag(Tag::Unknown(MODEL_TIEPOINT_TAG), &tiepoint[..])
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // Version 1.1.0 with two keys: GTModelTypeGeoKey = projected,
    // GTRasterTypeGeoKey = pixel-is-area
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY_TAG), &geokeys[..])
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_float_buffer_roundtrip() {
        let mut raster: Raster<f64> = Raster::new(4, 5);
        raster.set_transform(GeoTransform::new(10.0, 20.0, 2.0, -2.0));
        for r in 0..4 {
            for c in 0..5 {
                raster.set(r, c, (r * 5 + c) as f64 * 0.5).unwrap();
            }
        }

        let buf = write_geotiff_to_buffer(&raster).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&buf, None).unwrap();

        assert_eq!(back.shape(), (4, 5));
        assert_eq!(back.get(3, 4).unwrap(), 9.5);
        assert_eq!(*back.transform(), *raster.transform());
    }

    #[test]
    fn test_label_file_roundtrip_preserves_large_ids() {
        let mut labels: Raster<u32> = Raster::new(2, 2);
        labels.set(0, 0, 16_777_217).unwrap(); // not representable in f32
        labels.set(1, 1, 3).unwrap();

        let tmp = NamedTempFile::new().unwrap();
        write_label_geotiff(&labels, tmp.path()).unwrap();
        let back: Raster<u32> = read_geotiff(tmp.path(), None).unwrap();

        assert_eq!(back.get(0, 0).unwrap(), 16_777_217);
        assert_eq!(back.get(1, 1).unwrap(), 3);
        assert_eq!(back.get(0, 1).unwrap(), 0);
    }

    #[test]
    fn test_band_stack_from_files() {
        let a = Raster::filled(3, 3, 1.0);
        let b = Raster::filled(3, 3, 4.0);
        let fa = NamedTempFile::new().unwrap();
        let fb = NamedTempFile::new().unwrap();
        write_geotiff(&a, fa.path()).unwrap();
        write_geotiff(&b, fb.path()).unwrap();

        let stack = read_band_stack(&[fa.path(), fb.path()]).unwrap();
        assert_eq!(stack.band_count(), 2);
        assert_eq!(stack.pixel(2, 2), vec![1.0, 4.0]);
    }

    #[test]
    fn test_band_stack_dimension_mismatch() {
        let fa = NamedTempFile::new().unwrap();
        let fb = NamedTempFile::new().unwrap();
        write_geotiff(&Raster::filled(3, 3, 1.0_f64), fa.path()).unwrap();
        write_geotiff(&Raster::filled(2, 3, 1.0_f64), fb.path()).unwrap();

        let result = read_band_stack(&[fa.path(), fb.path()]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_missing_band_rejected() {
        let buf = write_geotiff_to_buffer(&Raster::filled(2, 2, 1.0_f64)).unwrap();
        let result: Result<Raster<f64>> = read_geotiff_from_buffer(&buf, Some(2));
        assert!(matches!(result, Err(Error::BandCountMismatch { .. })));
    }

    /// 2x2 RGB8 image: pixel i holds (i, 10 + i, 20 + i)
    fn rgb_buffer() -> Vec<u8> {
        let data: Vec<u8> = (0..4u8).flat_map(|i| [i, 10 + i, 20 + i]).collect();
        let mut buf = Vec::new();
        TiffEncoder::new(Cursor::new(&mut buf))
            .unwrap()
            .write_image::<tiff::encoder::colortype::RGB8>(2, 2, &data)
            .unwrap();
        buf
    }

    #[test]
    fn test_samples_per_pixel() {
        assert_eq!(samples_per_pixel(ColorType::Gray(32)).unwrap(), 1);
        assert_eq!(samples_per_pixel(ColorType::GrayA(8)).unwrap(), 2);
        assert_eq!(samples_per_pixel(ColorType::RGB(8)).unwrap(), 3);
        assert_eq!(samples_per_pixel(ColorType::RGBA(16)).unwrap(), 4);
        assert!(matches!(
            samples_per_pixel(ColorType::Palette(8)),
            Err(Error::UnsupportedDataType(_))
        ));
    }

    #[test]
    fn test_multi_sample_band_selection() {
        let buf = rgb_buffer();
        let green: Raster<u8> = read_geotiff_from_buffer(&buf, Some(2)).unwrap();
        assert_eq!(green.get(0, 0).unwrap(), 10);
        assert_eq!(green.get(1, 1).unwrap(), 13);

        let result: Result<Raster<u8>> = read_geotiff_from_buffer(&buf, Some(4));
        assert!(matches!(
            result,
            Err(Error::BandCountMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_single_multi_sample_file_is_a_stack() {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), rgb_buffer()).unwrap();

        let stack = read_band_stack(&[tmp.path()]).unwrap();
        assert_eq!(stack.band_count(), 3);
        assert_eq!(stack.shape(), (2, 2));
        assert_eq!(stack.pixel(0, 1), vec![1.0, 11.0, 21.0]);
    }
}
