//! fixed dispatch tables, one per fixture variant

use std::fmt;
use std::str::FromStr;

pub const TEST_BANNER: &str = "This is a test HTTP server!\n";
pub const RECORDER_BANNER: &str = "This is a ChangeMacroRecorder HTTP server!\n";
pub const NOT_FOUND_BODY: &str = "Not Found!\n";

/// which fixture behaviour the server reproduces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// `GET /` banner, `POST /post` echoes the form body back
    #[default]
    RawEcho,
    /// any `GET` banner, any `POST` parsed as JSON and acknowledged
    Json,
    /// any `GET` banner, any `POST` logged and answered with `Ok`
    PlainAck,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::RawEcho, Variant::Json, Variant::PlainAck];

    pub fn name(self) -> &'static str {
        match self {
            Variant::RawEcho => "raw-echo",
            Variant::Json => "json",
            Variant::PlainAck => "plain-ack",
        }
    }

    pub fn banner(self) -> &'static str {
        match self {
            Variant::RawEcho => TEST_BANNER,
            Variant::Json | Variant::PlainAck => RECORDER_BANNER,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariantError(String);

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown variant `{}`, expected one of raw-echo, json, plain-ack",
            self.0
        )
    }
}

impl std::error::Error for ParseVariantError {}

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseVariantError(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn matches(self, method: &str) -> bool {
        match self {
            Method::Get => method == "GET",
            Method::Post => method == "POST",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    Any,
    Exact(&'static str),
}

impl PathPattern {
    fn matches(self, path: &str) -> bool {
        match self {
            PathPattern::Any => true,
            PathPattern::Exact(p) => p == path,
        }
    }
}

/// what to do with a matched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Banner(&'static str),
    EchoForm,
    JsonAck,
    PlainAck,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: PathPattern,
    pub handler: Handler,
}

impl Route {
    pub const fn new(method: Method, path: PathPattern, handler: Handler) -> Self {
        Route {
            method,
            path,
            handler,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        RouteTable { routes }
    }

    pub fn for_variant(variant: Variant) -> Self {
        use self::Handler::*;
        use self::Method::*;
        use self::PathPattern::*;

        let routes = match variant {
            Variant::RawEcho => vec![
                Route::new(Get, Exact("/"), Banner(variant.banner())),
                Route::new(Post, Exact("/post"), EchoForm),
            ],
            Variant::Json => vec![
                Route::new(Get, Any, Banner(variant.banner())),
                Route::new(Post, Any, JsonAck),
            ],
            Variant::PlainAck => vec![
                Route::new(Get, Any, Banner(variant.banner())),
                Route::new(Post, Any, Handler::PlainAck),
            ],
        };
        RouteTable::new(routes)
    }

    /// first matching handler, `NotFound` when nothing matches
    pub fn dispatch(&self, method: &str, path: &str) -> Handler {
        self.routes
            .iter()
            .find(|r| r.method.matches(method) && r.path.matches(path))
            .map_or(Handler::NotFound, |r| r.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_echo_only_serves_two_paths() {
        let table = RouteTable::for_variant(Variant::RawEcho);
        assert_eq!(table.dispatch("GET", "/"), Handler::Banner(TEST_BANNER));
        assert_eq!(table.dispatch("POST", "/post"), Handler::EchoForm);
        assert_eq!(table.dispatch("GET", "/post"), Handler::NotFound);
        assert_eq!(table.dispatch("POST", "/"), Handler::NotFound);
        assert_eq!(table.dispatch("DELETE", "/"), Handler::NotFound);
    }

    #[test]
    fn recorder_variants_match_any_path() {
        let json = RouteTable::for_variant(Variant::Json);
        assert_eq!(json.dispatch("GET", "/x"), Handler::Banner(RECORDER_BANNER));
        assert_eq!(json.dispatch("POST", "/post"), Handler::JsonAck);
        assert_eq!(json.dispatch("PUT", "/"), Handler::NotFound);

        let ack = RouteTable::for_variant(Variant::PlainAck);
        assert_eq!(ack.dispatch("POST", "/anything"), Handler::PlainAck);
        assert_eq!(ack.dispatch("DELETE", "/"), Handler::NotFound);
    }

    #[test]
    fn method_match_is_case_sensitive() {
        let table = RouteTable::for_variant(Variant::PlainAck);
        assert_eq!(table.dispatch("get", "/"), Handler::NotFound);
    }

    #[test]
    fn first_match_wins() {
        let table = RouteTable::new(vec![
            Route::new(Method::Get, PathPattern::Exact("/"), Handler::PlainAck),
            Route::new(Method::Get, PathPattern::Any, Handler::EchoForm),
        ]);
        assert_eq!(table.dispatch("GET", "/"), Handler::PlainAck);
        assert_eq!(table.dispatch("GET", "/other"), Handler::EchoForm);
    }

    #[test]
    fn variant_names_round_trip() {
        for v in Variant::ALL {
            assert_eq!(v.name().parse::<Variant>(), Ok(v));
        }
        assert_eq!(" JSON ".parse::<Variant>(), Ok(Variant::Json));
        let err = "xml".parse::<Variant>().unwrap_err();
        assert!(err.to_string().contains("`xml`"));
    }
}
