//! HTTP facade: translates the wire surface onto the service layer and
//! serializes reports and records as JSON.

mod query;

use std::io::{self, Read};
use std::sync::{Arc, Mutex};

use may_minihttp::{HttpServer, HttpService, Request, Response};
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::{Result, TrackerError};
use crate::service::{CategoryInput, ExpenseInput, SalaryInput, TrackerService};
use crate::storage::ExpenseQuery;
use crate::watchdog::Watchdog;

pub use query::QueryParams;

/// One service instance is cloned per connection; all state is shared
/// behind `Arc`s.
#[derive(Clone)]
pub struct ApiService {
    service: Arc<TrackerService>,
    watchdog: Arc<Watchdog>,
}

enum Reply {
    Json {
        status: usize,
        reason: &'static str,
        value: serde_json::Value,
    },
    Csv {
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl Reply {
    fn ok(value: serde_json::Value) -> Self {
        Reply::Json {
            status: 200,
            reason: "OK",
            value,
        }
    }

    fn created(value: serde_json::Value) -> Self {
        Reply::Json {
            status: 201,
            reason: "Created",
            value,
        }
    }
}

impl ApiService {
    pub fn new(service: Arc<TrackerService>, watchdog: Arc<Watchdog>) -> Self {
        Self { service, watchdog }
    }

    fn route(
        &self,
        method: &str,
        path: &str,
        params: &QueryParams,
        body: &[u8],
    ) -> Result<Reply> {
        match (method, path) {
            ("GET", "/dashboard-stats") => {
                let report = self.service.dashboard(month_filter(params))?;
                Ok(Reply::ok(serde_json::to_value(report)?))
            }
            ("GET", "/stats/category") => {
                let totals = self.service.category_stats(month_filter(params))?;
                Ok(Reply::ok(serde_json::to_value(totals)?))
            }
            ("POST", "/salary") => {
                let input: SalaryInput = parse_body(body)?;
                let record = self.service.set_salary(input)?;
                Ok(Reply::ok(serde_json::to_value(record)?))
            }
            ("GET", "/expenses") => {
                let query = ExpenseQuery {
                    month: month_filter(params).map(str::to_string),
                    search: params.get("search").map(str::to_string),
                    category: params.get("category").map(str::to_string),
                    page: parse_number(params.get("page")).unwrap_or(1),
                    limit: parse_number(params.get("limit")).unwrap_or(50),
                };
                let page = self.service.list_expenses(&query)?;
                Ok(Reply::ok(serde_json::to_value(page)?))
            }
            ("POST", "/expenses") => {
                let input: ExpenseInput = parse_body(body)?;
                let created = self.service.add_expense(input)?;
                Ok(Reply::created(serde_json::to_value(created)?))
            }
            ("DELETE", "/expenses") => {
                self.service.clear_all()?;
                Ok(Reply::ok(json!({ "message": "All data deleted" })))
            }
            ("GET", "/export") => {
                let (file_name, bytes) = self.service.export(month_filter(params))?;
                Ok(Reply::Csv { file_name, bytes })
            }
            ("GET", "/categories") => {
                let categories = self.service.categories()?;
                Ok(Reply::ok(serde_json::to_value(categories)?))
            }
            ("POST", "/categories") => {
                let input: CategoryInput = parse_body(body)?;
                let created = self.service.add_category(input)?;
                Ok(Reply::created(serde_json::to_value(created)?))
            }
            ("POST", "/heartbeat") => {
                self.watchdog.record_activity();
                Ok(Reply::ok(json!({ "status": "ok" })))
            }
            _ => self.route_by_id(method, path, body),
        }
    }

    /// Routes carrying a numeric id segment: `/expenses/<id>` and
    /// `/categories/<id>`.
    fn route_by_id(&self, method: &str, path: &str, body: &[u8]) -> Result<Reply> {
        if let Some(raw) = path.strip_prefix("/expenses/") {
            let id = parse_id(raw)?;
            return match method {
                "PUT" => {
                    let input: ExpenseInput = parse_body(body)?;
                    let updated = self.service.update_expense(id, input)?;
                    Ok(Reply::ok(serde_json::to_value(updated)?))
                }
                "DELETE" => {
                    self.service.delete_expense(id)?;
                    Ok(Reply::ok(json!({ "message": "Deleted" })))
                }
                _ => Err(no_route(method, path)),
            };
        }
        if let Some(raw) = path.strip_prefix("/categories/") {
            let id = parse_id(raw)?;
            return match method {
                "DELETE" => {
                    self.service.delete_category(id)?;
                    Ok(Reply::ok(json!({ "message": "Deleted" })))
                }
                _ => Err(no_route(method, path)),
            };
        }
        Err(no_route(method, path))
    }
}

impl HttpService for ApiService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = req.method().to_owned();
        let target = req.path().to_owned();
        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;

        let (path, raw_query) = match target.split_once('?') {
            Some((path, raw_query)) => (path, raw_query),
            None => (target.as_str(), ""),
        };
        let params = QueryParams::parse(raw_query);
        debug!(%method, %path, "request");

        match self.route(&method, path, &params, &body) {
            Ok(Reply::Json {
                status,
                reason,
                value,
            }) => {
                if status != 200 {
                    res.status_code(status, reason);
                }
                res.header("Content-Type: application/json");
                let bytes = serde_json::to_vec(&value)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                res.body_mut().extend_from_slice(&bytes);
            }
            Ok(Reply::Csv { file_name, bytes }) => {
                res.header("Content-Type: text/csv");
                res.header(content_disposition(&file_name));
                res.body_mut().extend_from_slice(&bytes);
            }
            Err(err) => {
                let (status, reason) = status_for(&err);
                if status == 500 {
                    warn!(%method, %path, error = %err, "request failed");
                }
                res.status_code(status, reason);
                res.header("Content-Type: application/json");
                let bytes = serde_json::to_vec(&json!({ "error": err.to_string() }))
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                res.body_mut().extend_from_slice(&bytes);
            }
        }
        Ok(())
    }
}

/// Headers handed to the response must live for the whole process, so each
/// distinct download name is interned once and leaked. Bounded: one entry
/// per exported month key.
static DISPOSITIONS: Mutex<Vec<(String, &'static str)>> = Mutex::new(Vec::new());

fn content_disposition(file_name: &str) -> &'static str {
    let mut cache = match DISPOSITIONS.lock() {
        Ok(cache) => cache,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some((_, header)) = cache.iter().find(|(name, _)| name == file_name) {
        return header;
    }
    let header: &'static str = Box::leak(
        format!("Content-Disposition: attachment; filename={file_name}").into_boxed_str(),
    );
    cache.push((file_name.to_string(), header));
    header
}

/// Starts the facade on `addr` and blocks until the server stops.
pub fn serve(api: ApiService, addr: &str, workers: usize) -> io::Result<()> {
    may::config().set_workers(workers.max(1));
    let server = HttpServer(api).start(addr)?;
    server
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "server terminated unexpectedly"))
}

fn status_for(err: &TrackerError) -> (usize, &'static str) {
    match err {
        TrackerError::Validation(_) => (400, "Bad Request"),
        TrackerError::NotFound(_) => (404, "Not Found"),
        _ => (500, "Internal Server Error"),
    }
}

fn parse_body<T: serde::de::DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| TrackerError::Validation(format!("invalid JSON body: {err}")))
}

/// An empty `month=` parameter means "no filter", same as an absent one.
fn month_filter(params: &QueryParams) -> Option<&str> {
    params.get("month").filter(|month| !month.is_empty())
}

fn parse_number(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse().ok())
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| TrackerError::NotFound(format!("no record with id `{raw}`")))
}

fn no_route(method: &str, path: &str) -> TrackerError {
    TrackerError::NotFound(format!("no route for {method} {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_missing_records_map_to_client_errors() {
        let (status, _) = status_for(&TrackerError::Validation("bad".into()));
        assert_eq!(status, 400);
        let (status, _) = status_for(&TrackerError::NotFound("gone".into()));
        assert_eq!(status, 404);
        let (status, _) = status_for(&TrackerError::Storage("broken".into()));
        assert_eq!(status, 500);
    }

    #[test]
    fn empty_bodies_deserialize_to_defaults() {
        let input: ExpenseInput = parse_body(b"").expect("empty body");
        assert!(input.item.is_none());
        let err = parse_body::<ExpenseInput>(b"not json");
        assert!(matches!(err, Err(TrackerError::Validation(_))));
    }

    #[test]
    fn download_headers_carry_the_month_file_name() {
        let first = content_disposition("Expenses_Jan_2025.csv");
        assert_eq!(
            first,
            "Content-Disposition: attachment; filename=Expenses_Jan_2025.csv"
        );
        // Repeated exports of the same month reuse the interned header.
        let again = content_disposition("Expenses_Jan_2025.csv");
        assert!(std::ptr::eq(first, again));
        assert_eq!(
            content_disposition("All_Expenses.csv"),
            "Content-Disposition: attachment; filename=All_Expenses.csv"
        );
    }

    #[test]
    fn id_segments_must_be_numeric() {
        assert_eq!(parse_id("42").expect("numeric id"), 42);
        assert!(matches!(parse_id("latest"), Err(TrackerError::NotFound(_))));
    }
}
