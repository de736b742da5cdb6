//! the fixture `HttpService`

use std::io;
use std::sync::Arc;

use crate::console::Console;
use crate::http_server::HttpService;
use crate::request::Request;
use crate::response::{BodyWriter, Response};
use crate::routes::{Handler, RouteTable, Variant, NOT_FOUND_BODY};

const TEXT_PLAIN: &str = "Content-Type: text/plain; charset=utf-8";

/// runs a [`RouteTable`] for every request, cloned once per connection
#[derive(Clone)]
pub struct FixtureService {
    table: Arc<RouteTable>,
    console: Arc<dyn Console>,
}

impl FixtureService {
    pub fn new(table: RouteTable, console: Arc<dyn Console>) -> Self {
        FixtureService {
            table: Arc::new(table),
            console,
        }
    }

    pub fn for_variant(variant: Variant, console: Arc<dyn Console>) -> Self {
        Self::new(RouteTable::for_variant(variant), console)
    }

    fn echo_form(&self, body: &[u8], rsp: &mut Response) {
        let pairs = url::form_urlencoded::parse(body).count();
        debug!("form body with {pairs} pairs");
        rsp.body_mut().extend_from_slice(body);
        self.console.write_line(&String::from_utf8_lossy(body));
    }

    fn json_ack(&self, body: &[u8], rsp: &mut Response) -> io::Result<()> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.console.write_line(&value.to_string());
        serde_json::to_writer(
            BodyWriter(rsp.body_mut()),
            &serde_json::json!({ "result": "Ok" }),
        )?;
        Ok(())
    }

    fn plain_ack(&self, body: &[u8], rsp: &mut Response) {
        self.console.write_line(&String::from_utf8_lossy(body));
        rsp.body("Ok");
    }
}

impl HttpService for FixtureService {
    fn call(&mut self, req: Request, rsp: &mut Response) -> io::Result<()> {
        let handler = self.table.dispatch(req.method(), req.path());
        debug!("{req:?} -> {handler:?}");
        match handler {
            Handler::Banner(text) => {
                rsp.header(TEXT_PLAIN);
                rsp.body(text);
            }
            Handler::EchoForm => self.echo_form(req.body(), rsp),
            Handler::JsonAck => self.json_ack(req.body(), rsp)?,
            Handler::PlainAck => self.plain_ack(req.body(), rsp),
            Handler::NotFound => {
                rsp.status_code(404, "Not Found").header(TEXT_PLAIN);
                rsp.body(NOT_FOUND_BODY);
            }
        }
        Ok(())
    }
}
