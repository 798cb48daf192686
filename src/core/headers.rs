use http::{
    HeaderMap, Method,
    header::{HeaderValue, ValueIter},
};

pub(crate) fn connection_keep_alive(value: &HeaderValue) -> bool {
    value
        .to_str()
        .ok()
        .is_some_and(|s| s.split(',').any(|v| v.trim().eq_ignore_ascii_case("keep-alive")))
}

pub(crate) fn connection_close(value: &HeaderValue) -> bool {
    value
        .to_str()
        .ok()
        .is_some_and(|s| s.split(',').any(|v| v.trim().eq_ignore_ascii_case("close")))
}

pub(crate) fn content_length_parse_all(headers: &HeaderMap) -> Option<u64> {
    content_length_parse_all_values(headers.get_all(http::header::CONTENT_LENGTH).iter())
}

pub(crate) fn content_length_parse_all_values(values: ValueIter<'_, HeaderValue>) -> Option<u64> {
    // If multiple Content-Length headers were sent, everything can still
    // be alright if they all contain the same value, and all parse
    // correctly. If not, then it's an error.
    let mut content_length: Option<u64> = None;
    for value in values {
        if let Ok(line) = value.to_str() {
            for len in line.split(',') {
                if let Ok(len) = len.trim().parse::<u64>() {
                    if let Some(prev) = content_length {
                        if prev != len {
                            return None;
                        }
                    } else {
                        content_length = Some(len);
                    }
                } else {
                    return None;
                }
            }
        } else {
            return None;
        }
    }
    content_length
}

pub(crate) fn transfer_encoding_is_chunked(headers: &HeaderMap) -> bool {
    is_chunked(headers.get_all(http::header::TRANSFER_ENCODING).iter())
}

pub(crate) fn is_chunked<'a, I>(mut encodings: I) -> bool
where
    I: Iterator<Item = &'a HeaderValue>,
{
    // chunked must always be the last encoding, according to spec
    if let Some(line) = encodings.next_back() {
        return is_chunked_(line);
    }
    false
}

fn is_chunked_(value: &HeaderValue) -> bool {
    match value.to_str() {
        Ok(s) => s
            .rsplit(',')
            .next()
            .map(str::trim)
            .is_some_and(|v| v.eq_ignore_ascii_case("chunked")),
        Err(_) => false,
    }
}

pub(crate) fn add_chunked(mut entry: http::header::OccupiedEntry<'_, HeaderValue>) {
    const CHUNKED: &str = "chunked";

    if let Some(line) = entry.iter_mut().next_back() {
        // Otherwise, we can append to the existing value.
        let new_value = match line.to_str() {
            Ok(current) => format!("{current}, {CHUNKED}"),
            Err(_) => CHUNKED.to_owned(),
        };

        *line = HeaderValue::from_str(&new_value).expect("formatted header value is valid");
        return;
    }

    entry.insert(HeaderValue::from_static(CHUNKED));
}

pub(crate) fn method_has_defined_payload_semantics(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::DELETE | Method::CONNECT)
}
