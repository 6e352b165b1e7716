//! Network resource media and file reference constructors.
//!
//! Images and records sent to the gateway reference their payload as a
//! gateway file id, a `file://` local path, a `base64://` inline payload
//! or a plain URL. URL-referenced media additionally carries a
//! [`NetResource`] cache modifier telling the gateway whether a cached
//! download may be reused.

use std::io;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use url::Url;

use crate::media::{Field, Image, MediaCodec, Record, weak_bool, weak_i64, weak_str};

/// Cache modifier value letting the gateway reuse a cached download.
pub const CACHE_ENABLED: i64 = 1;
/// Cache modifier value forcing a fresh download.
pub const CACHE_DISABLED: i64 = 0;

/// Resource-cache modifier composed into media that reference network
/// resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetResource {
    /// [`CACHE_ENABLED`] or [`CACHE_DISABLED`].
    pub cache: i64,
}

impl NetResource {
    pub fn enable_cache(&mut self) {
        self.cache = CACHE_ENABLED;
    }

    pub fn disable_cache(&mut self) {
        self.cache = CACHE_DISABLED;
    }
}

/// An image referencing a network resource.
///
/// Same kind tag as [`Image`]; the field table is the image table plus
/// the cache modifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetImage {
    pub image: Image,
    pub resource: NetResource,
}

impl NetImage {
    pub fn enable_cache(&mut self) {
        self.resource.enable_cache();
    }

    pub fn disable_cache(&mut self) {
        self.resource.disable_cache();
    }
}

impl MediaCodec for NetImage {
    const KIND: &'static str = "image";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "file",
            get: |m| Value::from(m.image.file.clone()),
            set: |m, v| m.image.file = weak_str(v),
        },
        Field {
            key: "url",
            get: |m| Value::from(m.image.url.clone()),
            set: |m, v| m.image.url = weak_str(v),
        },
        Field {
            key: "cache",
            get: |m| Value::from(m.resource.cache),
            set: |m, v| m.resource.cache = weak_i64(v),
        },
    ];
}

/// An audio record referencing a network resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetRecord {
    pub record: Record,
    pub resource: NetResource,
}

impl NetRecord {
    pub fn enable_cache(&mut self) {
        self.resource.enable_cache();
    }

    pub fn disable_cache(&mut self) {
        self.resource.disable_cache();
    }
}

impl MediaCodec for NetRecord {
    const KIND: &'static str = "record";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "file",
            get: |m| Value::from(m.record.file.clone()),
            set: |m, v| m.record.file = weak_str(v),
        },
        Field {
            key: "magic",
            get: |m| Value::from(m.record.magic),
            set: |m, v| m.record.magic = weak_bool(v),
        },
        Field {
            key: "url",
            get: |m| Value::from(m.record.url.clone()),
            set: |m, v| m.record.url = weak_str(v),
        },
        Field {
            key: "cache",
            get: |m| Value::from(m.resource.cache),
            set: |m, v| m.resource.cache = weak_i64(v),
        },
    ];
}

/// Builds a `base64://` file reference from raw bytes.
pub fn file_base64(data: impl AsRef<[u8]>) -> String {
    format!("base64://{}", STANDARD.encode(data))
}

/// Reads a file and builds a `base64://` reference from its contents.
pub fn file_base64_from_path(path: impl AsRef<Path>) -> io::Result<String> {
    Ok(file_base64(std::fs::read(path)?))
}

/// Builds a `file://` reference to a local path.
pub fn file_local(path: impl AsRef<str>) -> String {
    format!("file://{}", path.as_ref())
}

impl Image {
    /// Image carrying its payload inline as `base64://`.
    pub fn base64(data: impl AsRef<[u8]>) -> Image {
        Image::new(file_base64(data))
    }

    /// Image read from a local file, inlined as `base64://`.
    pub fn base64_from_path(path: impl AsRef<Path>) -> io::Result<Image> {
        Ok(Image::new(file_base64_from_path(path)?))
    }

    /// Image referencing a path local to the gateway host.
    pub fn local(path: impl AsRef<str>) -> Image {
        Image::new(file_local(path))
    }

    /// Image downloaded by the gateway from a URL, cache enabled.
    pub fn web(url: &Url) -> NetImage {
        NetImage {
            image: Image::new(url.to_string()),
            resource: NetResource {
                cache: CACHE_ENABLED,
            },
        }
    }
}

impl Record {
    /// Record carrying its payload inline as `base64://`.
    pub fn base64(data: impl AsRef<[u8]>) -> Record {
        Record::new(file_base64(data))
    }

    /// Record read from a local file, inlined as `base64://`.
    pub fn base64_from_path(path: impl AsRef<Path>) -> io::Result<Record> {
        Ok(Record::new(file_base64_from_path(path)?))
    }

    /// Record referencing a path local to the gateway host.
    pub fn local(path: impl AsRef<str>) -> Record {
        Record::new(file_local(path))
    }

    /// Record downloaded by the gateway from a URL, cache enabled.
    pub fn web(url: &Url) -> NetRecord {
        NetRecord {
            record: Record::new(url.to_string()),
            resource: NetResource {
                cache: CACHE_ENABLED,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Media;

    #[test]
    fn test_image_web_cache_flag() {
        let url = Url::parse("https://img.example.com/i/D1D.jpg").unwrap();
        let mut img = Image::web(&url);
        assert_eq!(
            Media::from(img.clone()).to_cq(),
            "[CQ:image,file=https://img.example.com/i/D1D.jpg,url=,cache=1]"
        );
        img.disable_cache();
        assert_eq!(
            Media::from(img).to_cq(),
            "[CQ:image,file=https://img.example.com/i/D1D.jpg,url=,cache=0]"
        );
    }

    #[test]
    fn test_record_web_magic_and_cache() {
        let url = Url::parse("https://example.com/1.amr").unwrap();
        let mut rec = Record::web(&url);
        rec.record.magic = true;
        assert_eq!(
            Media::from(rec).to_cq(),
            "[CQ:record,file=https://example.com/1.amr,magic=true,url=,cache=1]"
        );
    }

    #[test]
    fn test_file_references() {
        assert_eq!(file_base64(b"ab"), "base64://YWI=");
        assert_eq!(file_local("/tmp/1.jpg"), "file:///tmp/1.jpg");
        assert_eq!(Image::base64(b"ab").file, "base64://YWI=");
        assert_eq!(Record::local("/tmp/1.amr").file, "file:///tmp/1.amr");
    }
}
