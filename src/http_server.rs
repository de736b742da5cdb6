//! http server implementation on top of `MAY`

use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};

use crate::request::{self, Request};
use crate::response::{self, Response};
use bytes::{Buf, BufMut, BytesMut};
use may::coroutine;
use may::net::{TcpListener, TcpStream};

macro_rules! t_c {
    ($e: expr) => {
        match $e {
            Ok(val) => val,
            Err(err) => {
                error!("call = {:?}\nerr = {:?}", stringify!($e), err);
                continue;
            }
        }
    };
}

/// the http service trait
/// user code should supply a type that impl the `call` method for the http server
///
/// an `Err` from `call` drops the connection without answering the request
pub trait HttpService {
    fn call(&mut self, req: Request, rsp: &mut Response) -> io::Result<()>;
}

const BUF_LEN: usize = 4096 * 8;
const READ_CHUNK: usize = 4096;

/// read once from the stream, appending to `req_buf`
///
/// returns the number of bytes read, zero when the peer closed
#[inline]
fn read_chunk(stream: &mut impl Read, req_buf: &mut BytesMut) -> io::Result<usize> {
    let start = req_buf.len();
    req_buf.resize(start + READ_CHUNK, 0);
    match stream.read(&mut req_buf[start..]) {
        Ok(n) => {
            req_buf.truncate(start + n);
            Ok(n)
        }
        Err(e) => {
            req_buf.truncate(start);
            Err(e)
        }
    }
}

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// per connection buffers
struct Conn {
    req_buf: BytesMut,
    body_buf: BytesMut,
    rsp_buf: BytesMut,
    // `100 Continue` already sent for the request being received
    continue_sent: bool,
}

impl Conn {
    fn new() -> Self {
        Conn {
            req_buf: BytesMut::with_capacity(BUF_LEN),
            body_buf: BytesMut::with_capacity(BUF_LEN),
            rsp_buf: BytesMut::with_capacity(BUF_LEN),
            continue_sent: false,
        }
    }

    /// answer every complete request at the head of `req_buf`
    fn serve_buffered<T: HttpService>(&mut self, service: &mut T) -> io::Result<()> {
        loop {
            let mut headers = [httparse::EMPTY_HEADER; request::MAX_HEADERS];
            let Some(req) = request::decode(&self.req_buf, &mut headers)? else {
                if !self.continue_sent && request::wants_continue(&self.req_buf) {
                    self.rsp_buf.put_slice(CONTINUE);
                    self.continue_sent = true;
                }
                return Ok(());
            };
            let len = req.len();
            let mut rsp = Response::new(&mut self.body_buf);
            service.call(req, &mut rsp)?;
            response::encode(rsp, &mut self.rsp_buf);
            self.req_buf.advance(len);
            self.continue_sent = false;
        }
    }
}

fn each_connection_loop<T: HttpService>(stream: &mut TcpStream, mut service: T) -> io::Result<()> {
    let mut conn = Conn::new();

    loop {
        if read_chunk(stream, &mut conn.req_buf)? == 0 {
            debug!("connection closed by peer");
            return Ok(());
        }

        let served = conn.serve_buffered(&mut service);

        // responses for requests ahead of a failing one still go out
        if !conn.rsp_buf.is_empty() {
            stream.write_all(&conn.rsp_buf)?;
            conn.rsp_buf.clear();
        }
        served?;
    }
}

/// `may::net::TcpListener::bind` turns on `SO_REUSEPORT`, so an occupied port
/// would bind fine and share connections; bind with std and hand the socket over
#[cfg(unix)]
fn bind_exclusive<L: ToSocketAddrs>(addr: L) -> io::Result<TcpListener> {
    use std::os::fd::{FromRawFd, IntoRawFd};

    let listener = std::net::TcpListener::bind(addr)?;
    // SAFETY: the fd is a listening socket released by `into_raw_fd`, owned by nobody else
    Ok(unsafe { TcpListener::from_raw_fd(listener.into_raw_fd()) })
}

#[cfg(windows)]
fn bind_exclusive<L: ToSocketAddrs>(addr: L) -> io::Result<TcpListener> {
    use std::os::windows::io::{FromRawSocket, IntoRawSocket};

    let listener = std::net::TcpListener::bind(addr)?;
    // SAFETY: the socket is released by `into_raw_socket`, owned by nobody else
    Ok(unsafe { TcpListener::from_raw_socket(listener.into_raw_socket()) })
}

/// this is the generic type http server
/// with a type parameter that impl `HttpService` trait
///
/// the listener is bound by [`HttpServer::bind`] and only starts accepting
/// once [`HttpServer::start`] is called
pub struct HttpServer<T> {
    service: T,
    listener: TcpListener,
}

/// a running server
pub struct ServerHandle {
    addr: SocketAddr,
    handle: coroutine::JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// cancel the accept coroutine and wait for it to finish
    ///
    /// connections that are already open keep being served
    pub fn stop(self) {
        // SAFETY: cancelling the accept coroutine only unwinds its own stack,
        // the handle stays valid until the join below
        unsafe {
            self.handle.coroutine().cancel();
        }
        self.handle.join().ok();
    }

    /// block until the accept coroutine finishes, which it never does on its own
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    pub fn bind<L: ToSocketAddrs>(service: T, addr: L) -> io::Result<Self> {
        let listener = bind_exclusive(addr)?;
        Ok(HttpServer { service, listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns the accept coroutine
    /// return a handle that you can stop when need to stop the service
    pub fn start(self) -> io::Result<ServerHandle> {
        let addr = self.local_addr()?;
        let HttpServer { service, listener } = self;
        let handle = go!(
            coroutine::Builder::new().name("FixtureServer".to_owned()),
            move || {
                for stream in listener.incoming() {
                    let mut stream = t_c!(stream);
                    let service = service.clone();
                    go!(move || if let Err(e) = each_connection_loop(&mut stream, service) {
                        error!("service err = {:?}", e);
                        stream.shutdown(std::net::Shutdown::Both).ok();
                    });
                }
            }
        )?;
        info!("listening on {addr}");
        Ok(ServerHandle { addr, handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Echo;

    impl HttpService for Echo {
        fn call(&mut self, req: Request, rsp: &mut Response) -> io::Result<()> {
            if req.path() == "/fail" {
                return Err(io::Error::new(io::ErrorKind::Other, "fail"));
            }
            rsp.body_mut().extend_from_slice(req.path().as_bytes());
            Ok(())
        }
    }

    #[test]
    fn read_chunk_appends() {
        let mut buf = BytesMut::from(&b"GET "[..]);
        let mut src: &[u8] = b"/ HTTP/1.1\r\n\r\n";
        let n = read_chunk(&mut src, &mut buf).unwrap();
        assert_eq!(n, 14);
        assert_eq!(&buf[..], b"GET / HTTP/1.1\r\n\r\n");
        assert_eq!(read_chunk(&mut src, &mut buf).unwrap(), 0);
        assert_eq!(buf.len(), 18);
    }

    fn conn_with(raw: &[u8]) -> Conn {
        let mut conn = Conn::new();
        conn.req_buf.extend_from_slice(raw);
        conn
    }

    #[test]
    fn pipelined_requests_are_answered_in_order() {
        let mut conn = conn_with(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\nGET /c");
        conn.serve_buffered(&mut Echo).unwrap();

        let out = String::from_utf8(conn.rsp_buf.to_vec()).unwrap();
        let a = out.find("\r\n\r\n/a").unwrap();
        let b = out.find("\r\n\r\n/b").unwrap();
        assert!(a < b);
        assert_eq!(out.matches("HTTP/1.1 200 Ok").count(), 2);
        // the incomplete third request stays buffered
        assert_eq!(&conn.req_buf[..], b"GET /c");
    }

    #[test]
    fn failing_request_keeps_earlier_responses() {
        let mut conn = conn_with(b"GET /a HTTP/1.1\r\n\r\nGET /fail HTTP/1.1\r\n\r\n");
        let err = conn.serve_buffered(&mut Echo).unwrap_err();
        assert_eq!(err.to_string(), "fail");
        assert!(conn.rsp_buf.ends_with(b"\r\n\r\n/a"));
    }

    #[test]
    fn expect_continue_is_answered_once_per_request() {
        let head = b"POST /p HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 4\r\n\r\n";
        let mut conn = conn_with(head);
        conn.serve_buffered(&mut Echo).unwrap();
        assert_eq!(&conn.rsp_buf[..], CONTINUE);
        conn.rsp_buf.clear();

        conn.req_buf.extend_from_slice(b"ab");
        conn.serve_buffered(&mut Echo).unwrap();
        assert!(conn.rsp_buf.is_empty());

        conn.req_buf.extend_from_slice(b"cd");
        conn.req_buf.extend_from_slice(head);
        conn.serve_buffered(&mut Echo).unwrap();
        let out = String::from_utf8(conn.rsp_buf.to_vec()).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 Ok\r\n"));
        // the next request waiting on its body gets its own interim response
        assert!(out.ends_with("\r\n\r\n/pHTTP/1.1 100 Continue\r\n\r\n"));
    }

    #[test]
    fn occupied_port_is_not_shared() {
        let first = bind_exclusive("127.0.0.1:0").unwrap();
        let addr = first.local_addr().unwrap();
        let err = bind_exclusive(addr).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
    }
}
