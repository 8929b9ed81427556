use serde::{Deserialize, Serialize};

/// Raw device signals as reported by the platform.
///
/// These are one-shot inputs: they are read before classification and never consulted
/// again. Nothing here is trusted on its own; see [`classify`](super::classify).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSignals {
    /// Browser or host user-agent string
    pub user_agent: String,
    /// Whether the device reports touch input
    pub touch_capable: bool,
    /// Viewport width in CSS / logical pixels
    pub viewport_width: u32,
    /// Viewport height in CSS / logical pixels
    pub viewport_height: u32,
    /// Reported device memory in GiB, when the platform exposes it
    pub device_memory_gb: Option<f32>,
    /// Physical-to-logical pixel ratio
    pub device_pixel_ratio: f32,
}

impl Default for DeviceSignals {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            touch_capable: false,
            viewport_width: 1280,
            viewport_height: 720,
            device_memory_gb: None,
            device_pixel_ratio: 1.0,
        }
    }
}

impl DeviceSignals {
    #[must_use]
    pub fn new(
        user_agent: impl Into<String>,
        touch_capable: bool,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            touch_capable,
            viewport_width,
            viewport_height,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_device_memory(mut self, gigabytes: f32) -> Self {
        self.device_memory_gb = Some(gigabytes);
        self
    }

    #[must_use]
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Reads the signals from the browser environment.
    ///
    /// `navigator.deviceMemory` is not part of every engine's API surface, so it is
    /// looked up reflectively and left as `None` when absent.
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser() -> crate::errors::Result<Self> {
        use crate::errors::AtriumError;
        use wasm_bindgen::JsValue;

        let window = web_sys::window()
            .ok_or_else(|| AtriumError::WasmError("No window found".to_string()))?;
        let navigator = window.navigator();

        let user_agent = navigator.user_agent().unwrap_or_default();
        let touch_capable = navigator.max_touch_points() > 0;
        let viewport_width = window
            .inner_width()?
            .as_f64()
            .unwrap_or_default()
            .max(0.0) as u32;
        let viewport_height = window
            .inner_height()?
            .as_f64()
            .unwrap_or_default()
            .max(0.0) as u32;
        let device_memory_gb = js_sys::Reflect::get(&navigator, &JsValue::from_str("deviceMemory"))
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v as f32);

        Ok(Self {
            user_agent,
            touch_capable,
            viewport_width,
            viewport_height,
            device_memory_gb,
            device_pixel_ratio: window.device_pixel_ratio() as f32,
        })
    }
}
