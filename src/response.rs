use std::io;

use bytes::{BufMut, BytesMut};

const MAX_RSP_HEADERS: usize = 16;

pub struct Response<'a> {
    headers: [&'static str; MAX_RSP_HEADERS],
    headers_len: usize,
    status_message: StatusMessage,
    body: &'a mut BytesMut,
}

struct StatusMessage {
    code: usize,
    msg: &'static str,
}

impl<'a> Response<'a> {
    pub(crate) fn new(body: &'a mut BytesMut) -> Response<'a> {
        body.clear();
        Response {
            headers: [""; MAX_RSP_HEADERS],
            headers_len: 0,
            status_message: StatusMessage {
                code: 200,
                msg: "Ok",
            },
            body,
        }
    }

    pub fn status_code(&mut self, code: usize, msg: &'static str) -> &mut Self {
        self.status_message = StatusMessage { code, msg };
        self
    }

    /// add a full header line, e.g. `"Content-Type: text/plain"`
    ///
    /// headers beyond the fixed capacity are dropped with a warning
    pub fn header(&mut self, header: &'static str) -> &mut Self {
        match self.headers.get_mut(self.headers_len) {
            Some(slot) => {
                *slot = header;
                self.headers_len += 1;
            }
            None => warn!("response header dropped: {header}"),
        }
        self
    }

    pub fn body(&mut self, s: &'static str) {
        self.body.put_slice(s.as_bytes());
    }

    pub fn body_mut(&mut self) -> &mut BytesMut {
        &mut *self.body
    }

    pub fn status(&self) -> usize {
        self.status_message.code
    }

    pub fn headers(&self) -> &[&'static str] {
        &self.headers[..self.headers_len]
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body[..]
    }
}

/// a `Write` adapter over the response body
pub struct BodyWriter<'a>(pub &'a mut BytesMut);

impl<'a> io::Write for BodyWriter<'a> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn encode(rsp: Response, buf: &mut BytesMut) {
    let mut code = itoa::Buffer::new();
    let mut len = itoa::Buffer::new();

    if rsp.status_message.code == 200 {
        buf.put_slice(b"HTTP/1.1 200 Ok\r\nServer: fixture-httpd\r\nDate: ");
    } else {
        buf.put_slice(b"HTTP/1.1 ");
        buf.put_slice(code.format(rsp.status_message.code).as_bytes());
        buf.put_slice(b" ");
        buf.put_slice(rsp.status_message.msg.as_bytes());
        buf.put_slice(b"\r\nServer: fixture-httpd\r\nDate: ");
    }
    crate::date::put_date(buf);
    buf.put_slice(b"\r\nContent-Length: ");
    buf.put_slice(len.format(rsp.body.len()).as_bytes());

    for h in rsp.headers() {
        buf.put_slice(b"\r\n");
        buf.put_slice(h.as_bytes());
    }

    buf.put_slice(b"\r\n\r\n");
    buf.put_slice(&rsp.body[..]);
}
