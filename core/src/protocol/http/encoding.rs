/*
 * encoding.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sfoglia, a minimal web fetcher.
 *
 * Sfoglia is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sfoglia is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sfoglia.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Content-encoding layer: gzip, raw deflate, brotli, identity. Runs on the body after
//! transfer framing has been removed.
//!
//! `Decoders` is the single source of truth for what can be decoded: the request writer builds
//! Accept-Encoding from it and `decode_content` refuses anything it does not contain.

use std::io::Read;
use std::str::FromStr;

use flate2::read::{DeflateDecoder, GzDecoder};

use crate::error::FetchError;
use crate::protocol::http::HeaderMap;

/// Set of content decoders available to a fetch. gzip and deflate are always present;
/// brotli when the `brotli` feature is compiled in and not switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoders {
    brotli: bool,
}

impl Decoders {
    /// Everything compiled into this build.
    pub fn available() -> Self {
        Self {
            brotli: cfg!(feature = "brotli"),
        }
    }

    pub fn without_brotli(self) -> Self {
        Self { brotli: false }
    }

    pub fn has_brotli(&self) -> bool {
        self.brotli
    }

    /// Value for the Accept-Encoding request header.
    pub fn accept_encoding(&self) -> &'static str {
        if self.brotli {
            "gzip, deflate, br"
        } else {
            "gzip, deflate"
        }
    }
}

impl Default for Decoders {
    fn default() -> Self {
        Self::available()
    }
}

/// Content-Encoding values we recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    Brotli,
    Identity,
}

impl FromStr for ContentEncoding {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("gzip") {
            Ok(Self::Gzip)
        } else if s.eq_ignore_ascii_case("deflate") {
            Ok(Self::Deflate)
        } else if s.eq_ignore_ascii_case("br") {
            Ok(Self::Brotli)
        } else if s.eq_ignore_ascii_case("identity") {
            Ok(Self::Identity)
        } else {
            Err(FetchError::Decoding(format!(
                "unexpected content-encoding: {}",
                s
            )))
        }
    }
}

/// Undo the content-encoding named in `headers`, if any.
pub fn decode_content(
    body: Vec<u8>,
    headers: &HeaderMap,
    decoders: &Decoders,
) -> Result<Vec<u8>, FetchError> {
    let encoding: ContentEncoding = match headers.get("content-encoding") {
        Some(value) => value.parse()?,
        None => return Ok(body),
    };
    tracing::debug!("content-encoding {:?}, {} bytes", encoding, body.len());
    match encoding {
        ContentEncoding::Identity => Ok(body),
        ContentEncoding::Gzip => read_all(GzDecoder::new(body.as_slice()), "gzip"),
        ContentEncoding::Deflate => read_all(DeflateDecoder::new(body.as_slice()), "deflate"),
        ContentEncoding::Brotli => {
            if !decoders.has_brotli() {
                return Err(FetchError::MissingDecoder("br".to_string()));
            }
            decode_brotli(&body)
        }
    }
}

/// Content layer followed by UTF-8 decoding.
pub fn decode_text(
    body: Vec<u8>,
    headers: &HeaderMap,
    decoders: &Decoders,
) -> Result<String, FetchError> {
    let bytes = decode_content(body, headers, decoders)?;
    String::from_utf8(bytes).map_err(|e| FetchError::Decoding(format!("body is not UTF-8: {}", e)))
}

fn read_all<R: Read>(mut reader: R, what: &str) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decoding(format!("invalid {} data: {}", what, e)))?;
    Ok(out)
}

#[cfg(feature = "brotli")]
fn decode_brotli(body: &[u8]) -> Result<Vec<u8>, FetchError> {
    read_all(brotli::Decompressor::new(body, 4096), "brotli")
}

#[cfg(not(feature = "brotli"))]
fn decode_brotli(_body: &[u8]) -> Result<Vec<u8>, FetchError> {
    Err(FetchError::MissingDecoder("br".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn headers(encoding: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("Content-Encoding", encoding);
        h
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn no_header_is_passthrough() {
        let out = decode_content(b"plain".to_vec(), &HeaderMap::new(), &Decoders::available());
        assert_eq!(out.unwrap(), b"plain");
    }

    #[test]
    fn gzip_and_identity() {
        let d = Decoders::available();
        let out = decode_text(gzip(b"<html>hi</html>"), &headers("gzip"), &d).unwrap();
        assert_eq!(out, "<html>hi</html>");
        let out = decode_text(b"as is".to_vec(), &headers("Identity"), &d).unwrap();
        assert_eq!(out, "as is");
    }

    #[test]
    fn deflate_is_raw() {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"raw deflate").unwrap();
        let body = enc.finish().unwrap();
        let out = decode_text(body, &headers("deflate"), &Decoders::available()).unwrap();
        assert_eq!(out, "raw deflate");
    }

    #[test]
    fn unknown_encoding_is_an_error() {
        let err = decode_content(b"x".to_vec(), &headers("zstd"), &Decoders::available());
        assert!(matches!(err, Err(FetchError::Decoding(_))));
    }

    #[test]
    fn corrupt_gzip_is_an_error() {
        let err = decode_content(b"not gzip".to_vec(), &headers("gzip"), &Decoders::available());
        assert!(matches!(err, Err(FetchError::Decoding(_))));
    }

    #[test]
    fn chunk_framing_must_be_removed_first() {
        let compressed = gzip(b"layered");
        let mut framed = format!("{:x}\r\n", compressed.len()).into_bytes();
        framed.extend_from_slice(&compressed);
        framed.extend_from_slice(b"\r\n0\r\n\r\n");
        let err = decode_content(framed, &headers("gzip"), &Decoders::available());
        assert!(matches!(err, Err(FetchError::Decoding(_))));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = decode_text(vec![0xff, 0xfe], &HeaderMap::new(), &Decoders::available());
        assert!(matches!(err, Err(FetchError::Decoding(_))));
    }

    #[test]
    fn brotli_disabled_is_missing_decoder() {
        let d = Decoders::available().without_brotli();
        assert_eq!(d.accept_encoding(), "gzip, deflate");
        let err = decode_content(b"x".to_vec(), &headers("br"), &d);
        assert!(matches!(err, Err(FetchError::MissingDecoder(e)) if e == "br"));
    }

    #[cfg(feature = "brotli")]
    #[test]
    fn brotli_round_trip() {
        let mut body = Vec::new();
        {
            let mut w = brotli::CompressorWriter::new(&mut body, 4096, 5, 22);
            w.write_all(b"brotli body").unwrap();
        }
        let d = Decoders::available();
        assert_eq!(d.accept_encoding(), "gzip, deflate, br");
        assert_eq!(decode_text(body, &headers("br"), &d).unwrap(), "brotli body");
    }
}
