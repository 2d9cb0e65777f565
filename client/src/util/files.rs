//! Moving bytes between the browser's `File`/`Blob` world and the core's
//! `ImageFile`/`ImageBlob`.

use registration::api::{ImageBlob, ImageFile};
use registration::registration::ObjectUrls;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Wrap bytes in a `Blob` of the given type.
pub fn bytes_to_blob(bytes: &[u8], mime: &str) -> Result<web_sys::Blob, JsValue> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::of1(&array);
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

/// Read a picked or dropped file into memory.
pub async fn read_file(file: &web_sys::File) -> Result<ImageFile, String> {
    let buffer = JsFuture::from(file.array_buffer()).await.map_err(|err| format!("{err:?}"))?;
    let buffer = buffer.dyn_into::<js_sys::ArrayBuffer>().map_err(|err| format!("{err:?}"))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(ImageFile::new(file.name(), file.type_(), bytes))
}

/// First file of a `FileList`, if any.
pub fn first_file(files: Option<web_sys::FileList>) -> Option<web_sys::File> {
    files?.get(0)
}

/// `URL.createObjectURL` / `URL.revokeObjectURL`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserObjectUrls;

impl ObjectUrls for BrowserObjectUrls {
    fn create(&self, blob: &ImageBlob) -> Option<String> {
        let created = bytes_to_blob(&blob.bytes, &blob.mime).and_then(|b| web_sys::Url::create_object_url_with_blob(&b));
        match created {
            Ok(url) => Some(url),
            Err(err) => {
                log::error!("createObjectURL failed: {err:?}");
                None
            }
        }
    }

    fn revoke(&self, url: &str) {
        if let Err(err) = web_sys::Url::revoke_object_url(url) {
            log::warn!("revokeObjectURL({url}) failed: {err:?}");
        }
    }
}
