//! Face-enhancement model wrapper.
//!
//! The network consumes a batch of aligned face crops in the signed
//! `[-1, 1]` range together with an 18-channel part-label tensor, and
//! emits enhanced crops of the same count and size. An overridden part
//! contributes its mask as that channel; a part left absent contributes a
//! zero channel, which the model reads as "infer this region yourself".

use crate::core::batch::Tensor4D;
use crate::core::config::{FaceEnhancerConfig, FaceSize};
use crate::core::constants::FACE_PART_COUNT;
use crate::core::errors::RestoreError;
use crate::core::inference::OrtInfer;
use crate::domain::parts::PartOverrides;
use crate::processors::normalization::{NormalizeImage, signed_to_display};
use crate::processors::resize::ResizeFilter;
use crate::utils::image::tensor_to_rgb_images;
use image::{RgbImage, imageops};
use tracing::debug;

const PARTS_INPUT_NAME: &str = "parts";

/// A loaded face-enhancement model.
#[derive(Debug)]
pub struct FaceEnhancerModel {
    inference: OrtInfer,
    face_size: FaceSize,
    normalizer: NormalizeImage,
}

impl FaceEnhancerModel {
    /// Loads the model described by the configuration.
    pub fn load(config: &FaceEnhancerConfig) -> Result<Self, RestoreError> {
        config.validate()?;
        let inference = OrtInfer::from_config(&config.checkpoint, config.session.as_ref(), None)?;
        debug!(
            model = inference.model_name(),
            face_size = %config.face_size,
            "loaded face enhancer"
        );
        Ok(Self {
            inference,
            face_size: config.face_size,
            normalizer: NormalizeImage::signed()?,
        })
    }

    /// The crop resolution this model was trained for.
    pub fn face_size(&self) -> FaceSize {
        self.face_size
    }

    /// Enhances one chunk of faces in a single forward pass.
    ///
    /// `chunk_offset` is the position of this chunk's first face within
    /// the whole flattened sequence; it selects the matching per-face
    /// override masks. Output order matches input order exactly.
    pub fn enhance_chunk(
        &self,
        faces: &[&RgbImage],
        parts: Option<&PartOverrides>,
        chunk_offset: usize,
    ) -> Result<Vec<RgbImage>, RestoreError> {
        let image_tensor = self.normalizer.rgb_batch_to_tensor(faces)?;
        let parts_tensor = assemble_parts_tensor(
            parts,
            faces.len(),
            chunk_offset,
            self.face_size.pixels(),
        );

        let output = self
            .inference
            .infer_4d_pair(("x", &image_tensor), (PARTS_INPUT_NAME, &parts_tensor))?;

        if output.shape()[0] != faces.len() {
            return Err(RestoreError::invalid_input(format!(
                "enhancer returned {} faces for a chunk of {}",
                output.shape()[0],
                faces.len()
            )));
        }

        let display = signed_to_display(output);
        tensor_to_rgb_images(&display)
    }
}

/// Builds the `[chunk, 18, size, size]` part-label tensor for one chunk
/// of faces.
///
/// Channel `p` of face `k` holds the override mask supplied for part `p`
/// and face `chunk_offset + k`, scaled to `[0, 1]`; channels without an
/// override stay zero. Masks are resized to the crop size if needed.
pub(crate) fn assemble_parts_tensor(
    parts: Option<&PartOverrides>,
    chunk_len: usize,
    chunk_offset: usize,
    size: u32,
) -> Tensor4D {
    let side = size as usize;
    let mut tensor = Tensor4D::zeros((chunk_len, FACE_PART_COUNT, side, side));
    let Some(overrides) = parts else {
        return tensor;
    };

    for (part, masks) in overrides.iter() {
        let channel = part.index();
        for k in 0..chunk_len {
            let mask = &masks[chunk_offset + k];
            let resized;
            let mask = if mask.dimensions() == (size, size) {
                mask
            } else {
                resized = imageops::resize(
                    mask,
                    size,
                    size,
                    ResizeFilter::NearestExact.filter_type(),
                );
                &resized
            };
            for (x, y, pixel) in mask.enumerate_pixels() {
                tensor[[k, channel, y as usize, x as usize]] = pixel.0[0] as f32 / 255.0;
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parts::FacePart;
    use image::{GrayImage, Luma};

    #[test]
    fn absent_overrides_yield_an_all_zero_tensor() {
        let tensor = assemble_parts_tensor(None, 2, 0, 8);
        assert_eq!(tensor.shape(), &[2, FACE_PART_COUNT, 8, 8]);
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn override_lands_in_its_part_channel_for_its_face_only() {
        // Face 1 carries a nose marker; face 0 does not. The marker must
        // appear only at [1, nose, ...] and nowhere else.
        let mut marker = GrayImage::new(4, 4);
        marker.put_pixel(2, 1, Luma([255]));
        let overrides = PartOverrides::new().with(
            FacePart::Nose,
            vec![GrayImage::new(4, 4), marker],
        );

        let tensor = assemble_parts_tensor(Some(&overrides), 2, 0, 4);
        let nose = FacePart::Nose.index();
        assert_eq!(tensor[[1, nose, 1, 2]], 1.0);
        assert_eq!(tensor[[0, nose, 1, 2]], 0.0);

        // Every other channel stays zero.
        let nonzero: usize = tensor.iter().filter(|&&v| v != 0.0).count();
        assert_eq!(nonzero, 1);
    }

    #[test]
    fn chunk_offset_selects_the_matching_masks() {
        // Three faces, chunked as [0..2] and [2..3]: the second chunk must
        // read mask index 2.
        let mut third = GrayImage::new(2, 2);
        third.put_pixel(0, 0, Luma([255]));
        let overrides = PartOverrides::new().with(
            FacePart::Skin,
            vec![GrayImage::new(2, 2), GrayImage::new(2, 2), third],
        );

        let tensor = assemble_parts_tensor(Some(&overrides), 1, 2, 2);
        assert_eq!(tensor[[0, FacePart::Skin.index(), 0, 0]], 1.0);
    }

    #[test]
    fn masks_are_resized_to_the_crop_side() {
        let mask = GrayImage::from_pixel(2, 2, Luma([255]));
        let overrides = PartOverrides::new().with(FacePart::Hair, vec![mask]);
        let tensor = assemble_parts_tensor(Some(&overrides), 1, 0, 4);
        // The 2x2 all-on mask fills the whole 4x4 channel.
        let hair = FacePart::Hair.index();
        assert!((0..4).all(|y| (0..4).all(|x| tensor[[0, hair, y, x]] == 1.0)));
    }
}
