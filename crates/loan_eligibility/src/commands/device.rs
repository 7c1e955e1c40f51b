use burn::backend::ndarray::NdArrayDevice;
use tracing::info;

/// Initializes the CPU device used for training.
///
/// The model is a single linear layer, so the `NdArray` backend is enough.
///
/// This function only exists to be able to change the device at a single location.
pub fn init_device() -> NdArrayDevice {
    info!("Initializing NdArray CPU device...");
    NdArrayDevice::default()
}
