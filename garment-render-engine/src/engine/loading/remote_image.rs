use std::sync::{Arc, Mutex};

use bevy::asset::RenderAssetUsages;
use bevy::image::{CompressedImageFormats, ImageFormat, ImageSampler, ImageType};
use bevy::prelude::*;

use crate::engine::loading::texture_loader::RequestToken;
use crate::engine::store::customization_state::DecalKind;

const REMOTE_SCHEMES: [&str; 4] = ["blob:", "data:", "http://", "https://"];

/// Whether `locator` is a URL the browser has to fetch rather than an asset path.
///
/// Uploaded images arrive as object URLs (`blob:https://host/uuid`), which the
/// asset server would read as an unknown asset source.
pub fn is_remote_locator(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    REMOTE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// A fetch handed to the [`RemoteImageFetcher`].
#[derive(Debug, Clone)]
pub struct RemoteImageRequest {
    pub kind: DecalKind,
    pub token: RequestToken,
    pub locator: String,
}

#[derive(Debug, Clone)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported for the response, if any.
    pub mime_type: Option<String>,
}

/// Outcome of one remote fetch.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub kind: DecalKind,
    pub token: RequestToken,
    pub result: Result<ImageBytes, String>,
}

/// Fetch results waiting to be settled, filled from async browser callbacks.
#[derive(Resource, Clone, Default)]
pub struct RemoteImageInbox(Arc<Mutex<Vec<FetchedImage>>>);

impl RemoteImageInbox {
    pub fn deliver(&self, fetched: FetchedImage) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(fetched);
        } else {
            error!("Remote image inbox is poisoned; dropped {:?}", fetched.token);
        }
    }

    pub fn drain(&self) -> Vec<FetchedImage> {
        self.0
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

/// Starts a fetch. Completion is reported through the inbox.
#[derive(Resource, Clone, Copy)]
pub struct RemoteImageFetcher(pub fn(RemoteImageRequest, RemoteImageInbox));

impl Default for RemoteImageFetcher {
    fn default() -> Self {
        Self(fetch_remote_image)
    }
}

/// Fetch `request.locator` through the browser's `fetch`.
pub fn fetch_remote_image(request: RemoteImageRequest, inbox: RemoteImageInbox) {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            let result = browser_fetch(&request.locator).await;
            inbox.deliver(FetchedImage {
                kind: request.kind,
                token: request.token,
                result,
            });
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        inbox.deliver(FetchedImage {
            kind: request.kind,
            token: request.token,
            result: Err(format!(
                "{} can only be fetched inside the browser",
                request.locator
            )),
        });
    }
}

#[cfg(target_arch = "wasm32")]
async fn browser_fetch(locator: &str) -> Result<ImageBytes, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or("Window object not available")?;
    let response = JsFuture::from(window.fetch_with_str(locator))
        .await
        .map_err(|e| format!("fetch failed: {:?}", e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|e| format!("unexpected fetch result: {:?}", e))?;
    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }

    let mime_type = response.headers().get("content-type").ok().flatten();
    let buffer = response
        .array_buffer()
        .map_err(|e| format!("body unavailable: {:?}", e))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|e| format!("body read failed: {:?}", e))?;

    Ok(ImageBytes {
        bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
        mime_type,
    })
}

/// Decode fetched bytes the same way the asset server's image loader would.
pub fn decode_image(image: &ImageBytes) -> Result<Image, String> {
    let format = image
        .mime_type
        .as_deref()
        .and_then(|mime| ImageFormat::from_mime_type(mime.split(';').next().unwrap_or(mime).trim()))
        .or_else(|| sniff_format(&image.bytes))
        .ok_or("unrecognised image format")?;

    Image::from_buffer(
        &image.bytes,
        ImageType::Format(format),
        CompressedImageFormats::NONE,
        true,
        ImageSampler::Default,
        RenderAssetUsages::default(),
    )
    .map_err(|e| e.to_string())
}

// Object URLs often come back without a usable content type.
fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}
