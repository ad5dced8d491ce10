// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod config;
pub mod error;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::DonutConfig;
pub use error::{Error, Result};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue, prelude::wasm_bindgen};
    use image::RgbaImage;
    use web_sys::{
        Document, Event, HtmlCanvasElement, HtmlImageElement, HtmlInputElement, KeyboardEvent, MouseEvent, Window,
    };

    use crate::config::{DonutConfig, PageBindings};
    use crate::controller::input::wasm::{keyboard_event_to_input, slider_to_input};
    use crate::controller::{FrameClock, FrameLoopContext, InputEvent, InputProcessor, InputState, KeyBindings};
    use crate::error::{Error, Result};
    use crate::logging;
    use crate::view::{texture, GpuContext, Renderer};

    #[wasm_bindgen(start)]
    pub async fn start() -> std::result::Result<(), JsValue> {
        logging::init();
        tracing::info!("starting donut");

        let config = DonutConfig::default();
        let (window, document, canvas) = init_canvas(config.page.canvas, config.width, config.height)?;
        if let Err(e) = setup_app(&window, &document, &canvas, config).await {
            tracing::error!("{e}");
            return Err(js_error(e.to_string()));
        }
        Ok(())
    }

    /// Main application setup for WASM
    async fn setup_app(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        config: DonutConfig,
    ) -> Result<()> {
        // Rejected before anything touches the GPU
        let mesh = config.torus.generate()?;

        let gpu = GpuContext::new(canvas, canvas.width(), canvas.height()).await?;
        let image = page_texture(document, config.page.texture_image).await;
        let mut renderer = Renderer::new(gpu, &config, &image).await?;
        let mut frame_loop = FrameLoopContext::new(&mut renderer, &mesh, config.rotation_period, config.resume_mode);

        let input_state = Rc::new(RefCell::new(InputState::new()));
        let processor = InputProcessor::new(KeyBindings { toggle_pause: config.toggle_key.clone() });
        setup_input_listeners(document, &config.page, input_state.clone(), processor)
            .map_err(|e| Error::setup(format!("failed to bind input listeners: {e:?}")))?;

        let clock = FrameClock::new();
        let canvas = canvas.clone();

        // Continuous redraw using requestAnimationFrame
        RcCellCallback::new(window.clone(), move || {
            if (canvas.width(), canvas.height()) != renderer.size() {
                renderer.resize(canvas.width(), canvas.height());
            }

            let input = *input_state.borrow();
            match frame_loop.tick(clock.elapsed(), &input, &mut renderer) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
                Err(e) => tracing::warn!("frame skipped: {e}"),
            }
        })
        .start();

        Ok(())
    }

    /// The page's texture `<img>`, or the painted texture when it is missing or unreadable
    async fn page_texture(document: &Document, id: &str) -> RgbaImage {
        let Some(img) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlImageElement>().ok())
        else {
            tracing::info!(id, "no texture image on the page, painting one");
            return texture::paint_donut(256, 256);
        };

        match texture::from_image_element(&img).await {
            Ok(image) => {
                tracing::info!(id, width = image.width(), height = image.height(), "loaded page texture");
                image
            }
            Err(e) => {
                tracing::warn!(id, "{e}, painting the texture instead");
                texture::paint_donut(256, 256)
            }
        }
    }

    /// Bind the page's sliders, play button and the toggle key
    fn setup_input_listeners(
        document: &Document,
        page: &PageBindings,
        input_state: Rc<RefCell<InputState>>,
        processor: InputProcessor,
    ) -> std::result::Result<(), JsValue> {
        for (axis, id) in page.sliders {
            let Some(slider) = document.get_element_by_id(id) else {
                tracing::warn!(id, "slider not found, axis stays at 0");
                continue;
            };
            let slider: HtmlInputElement = slider.dyn_into().map_err(|_| js_error(format!("#{id} is not an <input>")))?;

            let input_state = input_state.clone();
            let processor = processor.clone();
            let slider_for_cb = slider.clone();
            let on_input = Closure::wrap(Box::new(move |_e: Event| {
                if let Some(event) = slider_to_input(axis, &slider_for_cb) {
                    input_state.borrow_mut().process_event(&event, &processor);
                }
            }) as Box<dyn FnMut(Event)>);
            slider.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
            on_input.forget();
        }

        let button = page.play_buttons.iter().find_map(|id| document.get_element_by_id(id));
        if let Some(button) = button {
            let input_state = input_state.clone();
            let processor = processor.clone();
            let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
                input_state.borrow_mut().process_event(&InputEvent::TogglePause, &processor);
            }) as Box<dyn FnMut(MouseEvent)>);
            button.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
            click.forget();
        } else {
            tracing::warn!(ids = ?page.play_buttons, "play button not found, use the toggle key");
        }

        {
            let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
                if e.repeat() {
                    return;
                }
                input_state.borrow_mut().process_event(&keyboard_event_to_input(&e), &processor);
            }) as Box<dyn FnMut(KeyboardEvent)>);
            document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
            keydown.forget();
        }

        Ok(())
    }

    /// Reuse the page's canvas, or append one to the body
    fn init_canvas(id: &str, width: u32, height: u32) -> std::result::Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;

        if let Some(existing) = document.get_element_by_id(id) {
            let canvas = existing
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| js_error(format!("#{id} is not a canvas")))?;
            return Ok((window, document, canvas));
        }

        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        canvas_el.set_id(id);
        canvas_el.set_width(width);
        canvas_el.set_height(height);
        body.append_child(&canvas_el)?;
        Ok((window, document, canvas_el))
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    /// Self-rescheduling `requestAnimationFrame` callback
    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Schedule the next frame whether or not this one drew
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        tracing::error!("requestAnimationFrame failed: {e:?}");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!("requestAnimationFrame failed: {e:?}");
                }
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
        }
    }
}
