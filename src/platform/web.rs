use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::JsFuture;

use super::{FrameClock, LossFlagStore, RestartOutcome, SessionRestarter};
use crate::errors::{AtriumError, Result};
use crate::renderer::events::{ContextId, ContextLostEvent, ContextRestoredEvent, PlatformEvent};
use crate::utils::time::Instant;

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| AtriumError::WasmError("No window found".to_string()))
}

/// Frames driven by `requestAnimationFrame`.
#[derive(Debug, Default)]
pub struct AnimationFrameClock;

impl AnimationFrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FrameClock for AnimationFrameClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn next_frame(&mut self) -> Instant {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window()
                && window.request_animation_frame(&resolve).is_err()
            {
                log::warn!("requestAnimationFrame rejected; resolving immediately");
                let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
            }
        });
        if let Err(e) = JsFuture::from(promise).await {
            log::warn!("Animation frame wait failed: {e:?}");
        }
        Instant::now()
    }
}

/// Flag kept in `localStorage`.
#[derive(Debug, Clone)]
pub struct WebStorageLossFlagStore {
    key: String,
}

impl WebStorageLossFlagStore {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage> {
        window()?
            .local_storage()?
            .ok_or_else(|| AtriumError::Storage("localStorage is unavailable".to_string()))
    }
}

impl LossFlagStore for WebStorageLossFlagStore {
    fn read(&self) -> Result<bool> {
        Ok(Self::storage()?.get_item(&self.key)?.as_deref() == Some("1"))
    }

    fn write(&mut self, lost: bool) -> Result<()> {
        let storage = Self::storage()?;
        if lost {
            storage.set_item(&self.key, "1")?;
        } else {
            storage.remove_item(&self.key)?;
        }
        Ok(())
    }
}

/// Restarts by reloading the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageReloadRestarter;

impl SessionRestarter for PageReloadRestarter {
    fn restart(&mut self) -> Result<RestartOutcome> {
        log::info!("Reloading page to restart the session");
        window()?.location().reload()?;
        Ok(RestartOutcome::Reloading)
    }
}

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// `webglcontextlost` / `webglcontextrestored` listeners on a canvas.
///
/// `preventDefault()` is called inside the listener itself: the browser only honours it
/// synchronously. Listeners are removed on drop.
pub struct CanvasContextEvents {
    canvas: web_sys::HtmlCanvasElement,
    on_lost: EventClosure,
    on_restored: EventClosure,
}

impl CanvasContextEvents {
    pub fn attach(
        canvas: web_sys::HtmlCanvasElement,
        context: ContextId,
        events: flume::Sender<PlatformEvent>,
    ) -> Result<Self> {
        let lost_tx = events.clone();
        let on_lost = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let lost = ContextLostEvent::new(context, "webglcontextlost").already_prevented();
            if lost_tx.send(PlatformEvent::ContextLost(lost)).is_err() {
                log::warn!("Context lost after the renderer was dropped");
            }
        });

        let on_restored = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            let restored = ContextRestoredEvent { context };
            if events.send(PlatformEvent::ContextRestored(restored)).is_err() {
                log::warn!("Context restored after the renderer was dropped");
            }
        });

        canvas.add_event_listener_with_callback("webglcontextlost", on_lost.as_ref().unchecked_ref())?;
        canvas.add_event_listener_with_callback(
            "webglcontextrestored",
            on_restored.as_ref().unchecked_ref(),
        )?;

        Ok(Self {
            canvas,
            on_lost,
            on_restored,
        })
    }
}

impl Drop for CanvasContextEvents {
    fn drop(&mut self) {
        let _ = self.canvas.remove_event_listener_with_callback(
            "webglcontextlost",
            self.on_lost.as_ref().unchecked_ref(),
        );
        let _ = self.canvas.remove_event_listener_with_callback(
            "webglcontextrestored",
            self.on_restored.as_ref().unchecked_ref(),
        );
    }
}
