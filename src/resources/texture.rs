//! Raw asset fetching and image decoding.

use image::RgbaImage;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("no location origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name.trim_start_matches('/'))?)
}

/// Reads `file_name` from `./assets` natively or `<origin>/assets/` on the web.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    if file_name.is_empty() {
        anyhow::bail!("empty asset path");
    }
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./")
            .join("assets")
            .join(file_name.trim_start_matches('/'));
        std::fs::read(&path)
            .map_err(|e| anyhow::anyhow!("could not read {}: {}", path.display(), e))?
    };

    Ok(data)
}

pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// 1×1 opaque white, bound wherever an image failed to load.
pub fn white_pixel() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_bytes() {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(RgbaImage::new(4, 2))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(decode_image(&bytes).unwrap().dimensions(), (4, 2));
        assert!(decode_image(b"not an image").is_err());
    }

    #[test]
    fn empty_paths_fail() {
        let result = futures::executor::block_on(load_binary(""));
        assert!(result.is_err());
    }
}
