//! HTTP server for the survey report
//!
//! `survey-report serve data.json` → serves the HTML report and JSON APIs.
//! The input file is re-read on every request so edits show up on refresh.

use std::path::PathBuf;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::config::Config;
use crate::document::SurveyDocument;
use crate::report::html::{self, HtmlOptions};
use crate::report::{Report, ReportOptions};

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(error: impl ToString) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// What the server renders from
#[derive(Debug, Clone)]
pub struct ServeContext {
    pub input: PathBuf,
    pub config: Config,
}

/// A routed response before it is bound to a request
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json<T: Serialize>(status: u16, payload: &ApiResponse<T>) -> Self {
        let body = serde_json::to_string(payload).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"data":null,"error":"{}"}}"#, e)
        });
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain; charset=utf-8",
            body: "Not found".to_string(),
        }
    }
}

/// Start the report server on localhost
pub fn start_report_server(context: ServeContext, port: u16) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::other(e.to_string()))?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n\x1b[1;32mSurvey report\x1b[0m");
    eprintln!("   Source: {}", context.input.display());
    eprintln!("   Report: {}", url);
    eprintln!("   Press Ctrl+C to stop\n");
    tracing::info!(%addr, "serving report");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &context) {
            tracing::warn!("request failed: {}", e);
        }
    }

    Ok(())
}

fn handle_request(request: Request, context: &ServeContext) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();
    tracing::debug!(%method, path, "request");

    let reply = route(&method, path, context);
    let header = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
        .map_err(|_| std::io::Error::other("invalid content type header"))?;
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header);
    request.respond(response)
}

/// Map a request onto a reply
pub fn route(method: &Method, path: &str, context: &ServeContext) -> Reply {
    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => match load_report(context) {
            Ok(report) => {
                let options = HtmlOptions::from_config(&context.config);
                Reply::html(html::to_string(&report, &options))
            }
            Err(e) => Reply {
                status: 500,
                content_type: "text/plain; charset=utf-8",
                body: e.to_string(),
            },
        },

        (&Method::Get, "/api/report") => match load_report(context) {
            Ok(report) => Reply::json(200, &ApiResponse::success(report)),
            Err(e) => Reply::json(500, &ApiResponse::failure(e)),
        },

        (&Method::Get, "/api/document") => match SurveyDocument::load(&context.input) {
            Ok(doc) => Reply::json(200, &ApiResponse::success(doc)),
            Err(e) => Reply::json(500, &ApiResponse::failure(e)),
        },

        _ => Reply::not_found(),
    }
}

fn load_report(context: &ServeContext) -> crate::error::Result<Report> {
    let doc = SurveyDocument::load(&context.input)?;
    Ok(Report::assemble(
        &doc,
        &ReportOptions::from_config(&context.config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "results": {
            "raw_survey": { "topic": "咖啡" },
            "stats": [{ "question": "喜欢吗?", "answer": { "是": 2, "否": 1 }, "summary": "多数喜欢" }]
        },
        "interviewer_records": []
    }"#;

    fn context(dir: &tempfile::TempDir) -> ServeContext {
        let input = dir.path().join("survey.json");
        std::fs::write(&input, DOC).unwrap();
        ServeContext {
            input,
            config: Config::default(),
        }
    }

    #[test]
    fn test_index_serves_html() {
        let dir = tempfile::tempdir().unwrap();
        let reply = route(&Method::Get, "/", &context(&dir));
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/html"));
        assert!(reply.body.contains("咖啡 - 调查结果报告"));
        assert!(reply.body.contains(r#"id="question-0""#));
    }

    #[test]
    fn test_api_report() {
        let dir = tempfile::tempdir().unwrap();
        let reply = route(&Method::Get, "/api/report", &context(&dir));
        assert_eq!(reply.status, 200);
        let value: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["data"]["questions"][0]["id"], "question-0");
        assert_eq!(value["data"]["questions"][0]["chart"]["chart_type"], "pie");
    }

    #[test]
    fn test_api_document() {
        let dir = tempfile::tempdir().unwrap();
        let reply = route(&Method::Get, "/api/document", &context(&dir));
        let value: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(value["data"]["topic"], "咖啡");
    }

    #[test]
    fn test_missing_input_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServeContext {
            input: dir.path().join("missing.json"),
            config: Config::default(),
        };
        let reply = route(&Method::Get, "/api/report", &ctx);
        assert_eq!(reply.status, 500);
        let value: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(value["ok"], false);
        assert!(value["error"].as_str().unwrap().contains("missing.json"));
    }

    #[test]
    fn test_unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(route(&Method::Get, "/nope", &context(&dir)).status, 404);
        assert_eq!(route(&Method::Post, "/", &context(&dir)).status, 404);
    }
}
