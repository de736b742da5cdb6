use std::fmt;
use std::io;

pub(crate) const MAX_HEADERS: usize = 100;

/// largest request head (request line plus headers)
pub(crate) const MAX_HEAD_LEN: usize = 16 * 1024;

/// largest body the fixture accepts for a single request
pub(crate) const MAX_BODY_LEN: usize = 8 * 1024 * 1024;

pub struct Request<'buf, 'header> {
    req: httparse::Request<'header, 'buf>,
    // head plus body length, consumed from the read buffer once handled
    len: usize,
    body: &'buf [u8],
}

impl<'buf, 'header> Request<'buf, 'header> {
    pub fn method(&self) -> &str {
        self.req.method.unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.req.path.unwrap_or_default()
    }

    /// the complete request body
    pub fn body(&self) -> &'buf [u8] {
        self.body
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl<'buf, 'header> fmt::Debug for Request<'buf, 'header> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<HTTP Request {} {}>", self.method(), self.path())
    }
}

fn find_header<'a>(headers: &[httparse::Header<'a>], name: &str) -> Option<&'a [u8]> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value)
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn head_too_large(len: usize) -> io::Error {
    invalid(format!("request head too large: {len} bytes"))
}

fn content_length(headers: &[httparse::Header<'_>]) -> io::Result<usize> {
    if let Some(te) = find_header(headers, "Transfer-Encoding") {
        let te = String::from_utf8_lossy(te);
        if !te.trim().eq_ignore_ascii_case("identity") {
            return Err(invalid(format!("unsupported transfer encoding: {te}")));
        }
    }

    let Some(value) = find_header(headers, "Content-Length") else {
        return Ok(0);
    };
    let len = std::str::from_utf8(value)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .ok_or_else(|| invalid(format!("bad content length: {value:?}")))?;
    if len > MAX_BODY_LEN {
        return Err(invalid(format!("body too large: {len} bytes")));
    }
    Ok(len)
}

/// decode one request from the head of `buf`
///
/// returns `Ok(None)` until both the request head and the whole body
/// declared by `Content-Length` have been received
pub fn decode<'buf, 'header>(
    buf: &'buf [u8],
    headers: &'header mut [httparse::Header<'buf>; MAX_HEADERS],
) -> io::Result<Option<Request<'buf, 'header>>> {
    let mut req = httparse::Request::new(headers);

    let status = match req.parse(buf) {
        Ok(s) => s,
        Err(e) => return Err(invalid(format!("failed to parse http request: {e:?}"))),
    };

    let head_len = match status {
        httparse::Status::Complete(amt) if amt > MAX_HEAD_LEN => return Err(head_too_large(amt)),
        httparse::Status::Complete(amt) => amt,
        httparse::Status::Partial if buf.len() > MAX_HEAD_LEN => {
            return Err(head_too_large(buf.len()))
        }
        httparse::Status::Partial => return Ok(None),
    };

    let body_len = content_length(req.headers)?;
    let len = head_len + body_len;
    if buf.len() < len {
        return Ok(None);
    }

    Ok(Some(Request {
        req,
        len,
        body: &buf[head_len..len],
    }))
}

/// whether the request at the head of `buf` has a complete head carrying
/// `Expect: 100-continue` and is still waiting for its body
pub(crate) fn wants_continue(buf: &[u8]) -> bool {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let Ok(httparse::Status::Complete(head_len)) = req.parse(buf) else {
        return false;
    };
    let expects = find_header(req.headers, "Expect")
        .is_some_and(|v| v.eq_ignore_ascii_case(b"100-continue"));
    match content_length(req.headers) {
        Ok(body_len) => expects && body_len > 0 && buf.len() < head_len + body_len,
        Err(_) => false,
    }
}
