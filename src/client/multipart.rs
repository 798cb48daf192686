//! multipart/form-data
//!
//! To send a `multipart/form-data` body, construct a [`Form`], add fields to it,
//! and hand it to [`RequestBuilder::multipart`][crate::RequestBuilder::multipart].

use std::{borrow::Cow, fmt};

use bytes::Bytes;
use futures_util::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use http::HeaderMap;

use super::body::Body;
use crate::error::{BoxError, Error};

/// A multipart/form-data request.
pub struct Form {
    inner: FormParts<Part>,
}

/// A field in a multipart form.
pub struct Part {
    meta: PartMetadata,
    value: Body,
    body_length: Option<u64>,
}

pub(crate) struct FormParts<P> {
    boundary: String,
    computed_headers: Vec<Vec<u8>>,
    fields: Vec<(Cow<'static, str>, P)>,
    percent_encoding: PercentEncoding,
}

pub(crate) struct PartMetadata {
    mime: Option<mime_guess::Mime>,
    file_name: Option<Cow<'static, str>>,
    headers: HeaderMap,
}

pub(crate) trait PartProps {
    fn value_len(&self) -> Option<u64>;
    fn metadata(&self) -> &PartMetadata;
}

// ===== impl Form =====

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt_fields("Form", f)
    }
}

impl Form {
    /// Creates a new form with no fields.
    pub fn new() -> Form {
        Form {
            inner: FormParts::new(),
        }
    }

    /// Makes a field in the form case-sensitive for the `multipart/form-data`
    /// boundary's percent-encoding, as the default behavior is encoding
    /// special characters like `"` and `\r`/`\n` only.
    ///
    /// Note that this [adjusts the whole Form's formatting](https://url.spec.whatwg.org/#concept-header-extract).
    pub fn percent_encode_path_segment(mut self) -> Form {
        self.inner.percent_encoding = PercentEncoding::PathSegment;
        self
    }

    /// Configures this `Form` to percent-encode using the `attr-char` query set.
    pub fn percent_encode_attr_chars(mut self) -> Form {
        self.inner.percent_encoding = PercentEncoding::AttrChar;
        self
    }

    /// Configures this `Form` to skip percent-encoding, sending headers as-is.
    pub fn percent_encode_noop(mut self) -> Form {
        self.inner.percent_encoding = PercentEncoding::NoOp;
        self
    }

    /// Adds a text field to the form.
    pub fn text<T, U>(self, name: T, value: U) -> Form
    where
        T: Into<Cow<'static, str>>,
        U: Into<Cow<'static, str>>,
    {
        let part = Part::text(value);
        self.part(name, part)
    }

    /// Adds a customized `Part` to the form.
    pub fn part<T>(self, name: T, part: Part) -> Form
    where
        T: Into<Cow<'static, str>>,
    {
        self.with_inner(move |inner| inner.part(name, part))
    }

    fn with_inner<F>(self, func: F) -> Self
    where
        F: FnOnce(FormParts<Part>) -> FormParts<Part>,
    {
        Form {
            inner: func(self.inner),
        }
    }

    /// Returns the `multipart/form-data` boundary string for this form.
    ///
    /// Intended for use as a `Display`-able value in a `Content-Type` header, e.g.
    /// `format!("multipart/form-data; boundary={}", form.boundary())`.
    pub fn boundary(&self) -> &str {
        &self.inner.boundary
    }

    /// Consumes this `Form`, returning the length of the resulting body, if it can be known
    /// without reading every streamed part.
    pub(crate) fn compute_length(&mut self) -> Option<u64> {
        self.inner.compute_length()
    }

    /// Consumes this `Form`, turning it into the request body.
    pub(crate) fn stream(self) -> Body {
        if self.inner.fields.is_empty() {
            return Body::empty();
        }

        let mut inner = self.inner;
        inner.compute_headers();
        let boundary = inner.boundary.clone();
        let headers = std::mem::take(&mut inner.computed_headers);

        let mut streams: Vec<BoxStream<'static, Result<Bytes, BoxError>>> =
            Vec::with_capacity(inner.fields.len() * 3 + 1);

        for ((_, part), header) in inner.fields.into_iter().zip(headers) {
            let mut prefix = Vec::with_capacity(boundary.len() + header.len() + 4);
            prefix.extend_from_slice(b"--");
            prefix.extend_from_slice(boundary.as_bytes());
            prefix.extend_from_slice(b"\r\n");
            prefix.extend_from_slice(&header);

            streams.push(Box::pin(stream::once(async move { Ok(Bytes::from(prefix)) })));
            streams.push(Box::pin(
                part.value.into_stream().map_err(Into::into as fn(Error) -> BoxError),
            ));
            streams.push(Box::pin(stream::once(async move {
                Ok(Bytes::from_static(b"\r\n"))
            })));
        }

        let mut trailer = Vec::with_capacity(boundary.len() + 6);
        trailer.extend_from_slice(b"--");
        trailer.extend_from_slice(boundary.as_bytes());
        trailer.extend_from_slice(b"--\r\n");
        streams.push(Box::pin(stream::once(async move { Ok(Bytes::from(trailer)) })));

        Body::stream(stream::iter(streams).flatten())
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.meta.fmt_fields(&mut f.debug_struct("Part")).finish()
    }
}

impl Part {
    /// Makes a text parameter.
    pub fn text<T>(value: T) -> Part
    where
        T: Into<Cow<'static, str>>,
    {
        let body = match value.into() {
            Cow::Borrowed(slice) => Body::from(slice),
            Cow::Owned(string) => Body::from(string),
        };
        Part::new(body, None)
    }

    /// Makes a new parameter from arbitrary bytes.
    pub fn bytes<T>(value: T) -> Part
    where
        T: Into<Cow<'static, [u8]>>,
    {
        let body = match value.into() {
            Cow::Borrowed(slice) => Body::from(slice),
            Cow::Owned(vec) => Body::from(vec),
        };
        Part::new(body, None)
    }

    /// Makes a new parameter from an arbitrary stream.
    pub fn stream<T>(value: T) -> Part
    where
        T: Into<Body>,
    {
        Part::new(value.into(), None)
    }

    /// Makes a new parameter from an arbitrary stream with a known length. This is particularly
    /// useful when adding something like file contents as a stream, where you can know the
    /// content length beforehand without reading the entire contents into memory.
    pub fn stream_with_length<T>(value: T, length: u64) -> Part
    where
        T: Into<Body>,
    {
        Part::new(value.into(), Some(length))
    }

    fn new(value: Body, body_length: Option<u64>) -> Part {
        let body_length = body_length.or_else(|| value.content_length());
        Part {
            meta: PartMetadata::new(),
            value,
            body_length,
        }
    }

    /// Tries to set the mime by parsing given mime type.
    pub fn mime_str(self, mime: &str) -> crate::Result<Part> {
        Ok(self.mime(mime.parse().map_err(Error::builder)?))
    }

    fn mime(self, mime: mime_guess::Mime) -> Part {
        self.with_inner(move |inner| inner.mime(mime))
    }

    /// Sets the filename, builder style.
    pub fn file_name<T>(self, filename: T) -> Part
    where
        T: Into<Cow<'static, str>>,
    {
        self.with_inner(move |inner| inner.file_name(filename))
    }

    /// Sets custom headers for the part.
    pub fn headers(self, headers: HeaderMap) -> Part {
        self.with_inner(move |inner| inner.headers(headers))
    }

    fn with_inner<F>(self, func: F) -> Self
    where
        F: FnOnce(PartMetadata) -> PartMetadata,
    {
        Part {
            meta: func(self.meta),
            ..self
        }
    }
}

impl PartProps for Part {
    fn value_len(&self) -> Option<u64> {
        self.body_length
    }

    fn metadata(&self) -> &PartMetadata {
        &self.meta
    }
}

/// Puts a boundary in a multipart body.
pub(crate) fn generate_boundary() -> String {
    use std::fmt::Write;

    let mut b = String::with_capacity(38);
    b.push_str("------------------------");
    let bytes: [u64; 2] = [fastrand::u64(..), fastrand::u64(..)];
    let _ = write!(b, "{:016x}{:016x}", bytes[0], bytes[1]);
    b
}

// ===== impl FormParts =====

impl<P: PartProps> FormParts<P> {
    pub(crate) fn new() -> Self {
        FormParts {
            boundary: generate_boundary(),
            computed_headers: Vec::new(),
            fields: Vec::new(),
            percent_encoding: PercentEncoding::PathSegment,
        }
    }

    pub(crate) fn boundary<T>(mut self, boundary: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.boundary = boundary.into().into_owned();
        self
    }

    /// Adds a customized part to the form.
    pub(crate) fn part<T>(mut self, name: T, part: P) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.fields.push((name.into(), part));
        self
    }

    /// Generate the headers used for a body, returning a set of bytes that can be prefixed
    /// before the value of a field.
    fn part_headers(name: &str, part: &P, percent_encoding: PercentEncoding) -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(b"Content-Disposition: form-data; ");
        header.extend_from_slice(
            format!("name=\"{}\"", percent_encoding.encode(name)).as_bytes(),
        );

        if let Some(filename) = part.metadata().file_name.as_ref() {
            header.extend_from_slice(
                format!("; filename=\"{}\"", percent_encoding.encode(filename)).as_bytes(),
            );
        }

        if let Some(mime) = part.metadata().mime.as_ref() {
            header.extend_from_slice(format!("\r\nContent-Type: {mime}").as_bytes());
        }

        for (k, v) in part.metadata().headers.iter() {
            header.extend_from_slice(format!("\r\n{}: ", k).as_bytes());
            header.extend_from_slice(v.as_bytes());
        }
        header.extend_from_slice(b"\r\n\r\n");
        header
    }

    /// Compute the length of this form, if possible to know in advance, by summing up the
    /// known lengths of each field's header, value, and trailing CRLF.
    pub(crate) fn compute_length(&mut self) -> Option<u64> {
        let mut length = 0u64;
        self.computed_headers.clear();
        for (name, field) in self.fields.iter() {
            match field.value_len() {
                Some(value_length) => {
                    let header = Self::part_headers(name, field, self.percent_encoding);
                    length += self.boundary.len() as u64 + 4 // "--boundary\r\n"
                        + header.len() as u64
                        + value_length
                        + 2; // trailing "\r\n"
                    self.computed_headers.push(header);
                }
                None => return None,
            }
        }
        length += self.boundary.len() as u64 + 4; // "--boundary--"
        Some(length)
    }

    /// Renders all fields' headers, for use when the length is already known (or can't be
    /// computed ahead of time and headers must be built lazily while streaming).
    fn compute_headers(&mut self) {
        self.computed_headers.clear();
        for (name, field) in self.fields.iter() {
            self.computed_headers
                .push(Self::part_headers(name, field, self.percent_encoding));
        }
    }

    fn fmt_fields(&self, ty_name: &'static str, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        P: fmt::Debug,
    {
        f.debug_struct(ty_name)
            .field("boundary", &self.boundary)
            .field(
                "parts",
                &self.fields.iter().map(|&(_, ref v)| v).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PartMetadata {
    pub(crate) fn new() -> Self {
        PartMetadata {
            mime: None,
            file_name: None,
            headers: HeaderMap::default(),
        }
    }

    pub(crate) fn mime(mut self, mime: mime_guess::Mime) -> Self {
        self.mime = Some(mime);
        self
    }

    pub(crate) fn file_name<T>(mut self, filename: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.file_name = Some(filename.into());
        self
    }

    pub(crate) fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

impl PartMetadata {
    pub(crate) fn fmt_fields<'f, 'fa, 'fb>(
        &self,
        debug_struct: &'f mut fmt::DebugStruct<'fa, 'fb>,
    ) -> &'f mut fmt::DebugStruct<'fa, 'fb> {
        debug_struct
            .field("name", &self.file_name)
            .field("mime", &self.mime)
            .field("headers", &self.headers)
    }
}

#[derive(Clone, Copy)]
enum PercentEncoding {
    PathSegment,
    AttrChar,
    NoOp,
}

impl PercentEncoding {
    fn encode(self, value: &str) -> Cow<'_, str> {
        match self {
            PercentEncoding::PathSegment => {
                percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC)
                    .into()
            }
            PercentEncoding::AttrChar => {
                percent_encoding::utf8_percent_encode(value, percent_encoding::NON_ALPHANUMERIC)
                    .into()
            }
            PercentEncoding::NoOp => value.into(),
        }
    }
}
