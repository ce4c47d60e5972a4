//! Optional extensions to the base camera controller.

#[cfg(feature = "extension_occlusion_indicator")]
pub mod occlusion_indicator;
