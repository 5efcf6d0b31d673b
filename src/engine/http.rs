//! HTTP binding of the arithmetic engine
//!
//! Requests go to `<base_url><namespace>/<op>`. The state query is a GET,
//! everything else a JSON POST. Every request carries the session's
//! anti-forgery token.

use std::time::Duration;

use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::MAX_BASE;
use crate::domain::core::GridSnapshot;
use crate::engine::{ArithmeticEngine, EngineCallError, EngineErrorKind, EngineOp};

/// Header carrying the anti-forgery token
pub const XSRF_HEADER: &str = "XSRF-Token";

/// Engine reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpEngine {
    agent: ureq::Agent,
    root: String,
    xsrf_token: String,
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Self {
            agent,
            root: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.namespace.trim_end_matches('/')
            ),
            xsrf_token: config.xsrf_token.clone(),
        }
    }

    /// Full URL for an operation
    pub fn endpoint(&self, op: &EngineOp) -> String {
        format!("{}{}", self.root, op.path())
    }
}

impl ArithmeticEngine for HttpEngine {
    fn execute(&mut self, op: EngineOp) -> Result<GridSnapshot, EngineCallError> {
        let url = self.endpoint(&op);
        debug!(op = op.name(), %url, "engine request");

        let result = match op.body() {
            None => self
                .agent
                .get(&url)
                .set(XSRF_HEADER, &self.xsrf_token)
                .call(),
            Some(body) => self
                .agent
                .post(&url)
                .set(XSRF_HEADER, &self.xsrf_token)
                .send_json(body),
        };

        let response = result.map_err(|err| match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                EngineCallError::new(op, EngineErrorKind::Status { code, body })
            }
            ureq::Error::Transport(transport) => {
                EngineCallError::new(op, EngineErrorKind::Transport(transport.to_string()))
            }
        })?;

        let snapshot = response
            .into_json::<GridSnapshot>()
            .map_err(|err| EngineCallError::new(op, EngineErrorKind::Decode(err.to_string())))?;

        if snapshot.width >= MAX_BASE {
            return Err(EngineCallError::new(
                op,
                EngineErrorKind::Decode(format!(
                    "grid width {} exceeds the supported maximum of {}",
                    snapshot.width,
                    MAX_BASE - 1
                )),
            ));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves a single canned response and hands back the raw request
    fn one_shot_server(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8_lossy(&payload));

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            tx.send(request).unwrap();
        });

        (format!("http://{addr}"), rx)
    }

    fn config_for(base_url: String) -> EngineConfig {
        EngineConfig {
            base_url,
            xsrf_token: "tok-123".into(),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn endpoint_joins_namespace_and_operation() {
        let engine = HttpEngine::new(&config_for("http://localhost:5000/".into()));
        assert_eq!(
            engine.endpoint(&EngineOp::Add { row: 0, weight: 1 }),
            "http://localhost:5000/api/abacus/add"
        );
    }

    #[test]
    fn add_posts_body_with_token_and_parses_snapshot() {
        let (url, requests) = one_shot_server("200 OK", r#"{"width":4,"divider":4,"rows":[[2,2]]}"#);
        let mut engine = HttpEngine::new(&config_for(url));

        let snapshot = engine.add(2, 2).unwrap();
        assert_eq!(snapshot.rows, vec![(2, 2)]);

        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /api/abacus/add "));
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.contains("xsrf-token: tok-123"));
        assert!(lowered.contains("content-type: application/json"));
        assert!(request.contains(r#""y":2"#));
        assert!(request.contains(r#""k":2"#));
    }

    #[test]
    fn non_success_status_is_engine_call_error() {
        let (url, _requests) = one_shot_server("500 Internal Server Error", r#"{"error":"nope"}"#);
        let mut engine = HttpEngine::new(&config_for(url));

        let err = engine.sub(3, 1).unwrap_err();
        assert_eq!(err.op, EngineOp::Sub { row: 3, weight: 1 });
        assert!(matches!(err.kind, EngineErrorKind::Status { code: 500, .. }));
    }

    #[test]
    fn state_is_a_get() {
        let (url, requests) = one_shot_server("200 OK", r#"{"width":1,"divider":1,"rows":[]}"#);
        let mut engine = HttpEngine::new(&config_for(url));

        let snapshot = engine.state().unwrap();
        assert_eq!(snapshot.width, 1);
        assert!(requests.recv().unwrap().starts_with("GET /api/abacus/state "));
    }

    #[test]
    fn oversized_grid_is_decode_error() {
        let (url, _requests) = one_shot_server("200 OK", r#"{"width":3999999999,"divider":1,"rows":[]}"#);
        let mut engine = HttpEngine::new(&config_for(url));

        let err = engine.state().unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::Decode(_)));
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let (url, _requests) = one_shot_server("200 OK", "not json");
        let mut engine = HttpEngine::new(&config_for(url));

        let err = engine.mul2(1).unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::Decode(_)));
    }
}
