//! `image-width/height/size` 使用的图片尺寸探测，只读取文件头。

use crate::error::{LessError, LessResult};
use crate::utils::unquote;
use std::fs;
use std::path::{Path, PathBuf};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// 解析图片路径并返回 `(宽, 高)` 像素值。
pub fn dimensions(base_dir: Option<&Path>, raw: &str) -> LessResult<(u32, u32)> {
    let target = image_path(raw);
    if is_remote(target) {
        return Err(LessError::image(target, "不支持远程图片"));
    }
    let path = resolve(base_dir, target);
    let bytes = fs::read(&path).map_err(|err| LessError::image(target, err.to_string()))?;
    probe(&bytes).ok_or_else(|| LessError::image(target, "无法识别的图片格式"))
}

fn image_path(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("url(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(trimmed);
    unquote(inner).0
}

fn is_remote(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://") || lowered.starts_with("//")
}

fn resolve(base_dir: Option<&Path>, target: &str) -> PathBuf {
    let path = Path::new(target);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

fn probe(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.starts_with(PNG_SIGNATURE) {
        return probe_png(bytes);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return probe_gif(bytes);
    }
    if bytes.starts_with(&[0xff, 0xd8]) {
        return probe_jpeg(bytes);
    }
    None
}

fn probe_png(bytes: &[u8]) -> Option<(u32, u32)> {
    let width = bytes.get(16..20)?;
    let height = bytes.get(20..24)?;
    Some((
        u32::from_be_bytes(width.try_into().ok()?),
        u32::from_be_bytes(height.try_into().ok()?),
    ))
}

fn probe_gif(bytes: &[u8]) -> Option<(u32, u32)> {
    let width = bytes.get(6..8)?;
    let height = bytes.get(8..10)?;
    Some((
        u32::from(u16::from_le_bytes(width.try_into().ok()?)),
        u32::from(u16::from_le_bytes(height.try_into().ok()?)),
    ))
}

fn probe_jpeg(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut offset = 2;
    while offset + 4 <= bytes.len() {
        if bytes[offset] != 0xff {
            offset += 1;
            continue;
        }
        let marker = bytes[offset + 1];
        if marker == 0xff {
            offset += 1;
            continue;
        }
        let length = usize::from(u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]));
        // SOF0..SOF15，排除 DHT(C4)、JPG(C8)、DAC(CC)
        if (0xc0..=0xcf).contains(&marker) && !matches!(marker, 0xc4 | 0xc8 | 0xcc) {
            let frame = bytes.get(offset + 5..offset + 9)?;
            let height = u16::from_be_bytes([frame[0], frame[1]]);
            let width = u16::from_be_bytes([frame[2], frame[3]]);
            return Some((u32::from(width), u32::from(height)));
        }
        offset += 2 + length;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 13]);
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    #[test]
    fn reads_png_header() {
        assert_eq!(probe(&png(120, 40)), Some((120, 40)));
    }

    #[test]
    fn reads_gif_header() {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&[10, 0, 20, 0]);
        assert_eq!(probe(&bytes), Some((10, 20)));
    }

    #[test]
    fn reads_jpeg_frame() {
        let bytes = [
            0xff, 0xd8, // SOI
            0xff, 0xe0, 0x00, 0x04, 0x00, 0x00, // APP0
            0xff, 0xc0, 0x00, 0x11, 0x08, 0x00, 0x30, 0x00, 0x40, // SOF0 48x64
        ];
        assert_eq!(probe(&bytes), Some((64, 48)));
    }

    #[test]
    fn resolves_against_base_dir() {
        let dir = std::env::temp_dir().join(format!("less_engine_image_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("logo.png"), png(32, 16)).unwrap();
        assert_eq!(dimensions(Some(&dir), "\"logo.png\"").unwrap(), (32, 16));
        assert_eq!(dimensions(Some(&dir), "url('logo.png')").unwrap(), (32, 16));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failures_are_image_errors() {
        assert!(matches!(
            dimensions(None, "\"https://example.com/a.png\""),
            Err(LessError::ImageResolutionError { .. })
        ));
        assert!(matches!(
            dimensions(None, "\"/definitely/missing.png\""),
            Err(LessError::ImageResolutionError { .. })
        ));
        assert_eq!(probe(b"not an image"), None);
    }
}
