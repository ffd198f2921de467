//! Utility functions for images, tensors, and checkpoint discovery.

pub mod checkpoint;
pub mod image;
pub mod transform;

pub use checkpoint::list_checkpoints;
pub use image::{
    create_rgb_image, dynamic_to_gray, dynamic_to_rgb, load_image, load_images_batch,
    tensor_to_gray_images, tensor_to_rgb_images,
};
pub use transform::{Point2f, warp_affine_rgb, warp_affine_scalar};
