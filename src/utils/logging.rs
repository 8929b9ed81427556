/// Routes `log` records to the browser console.
///
/// Native hosts install their own logger (`env_logger` in tests and tools).
#[cfg(target_arch = "wasm32")]
pub fn init_web_logging(level: log::Level) -> crate::errors::Result<()> {
    console_log::init_with_level(level)
        .map_err(|e| crate::errors::AtriumError::WasmError(e.to_string()))
}
