// In-memory stand-in for the REST backend, served through wiremock.
//
// Mirrors the backend's observable behavior: 404 for an empty record list,
// 400 on duplicate names, 401 for a missing or wrong bearer token.

#![allow(dead_code)]

use dummy_console::api::ApiClient;
use dummy_console::credential_store::MemoryCredentialStore;
use dummy_console::Console;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const USERNAME: &str = "ann";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "good-token";

#[derive(Default)]
struct Store {
    next_id: i64,
    records: BTreeMap<i64, Value>,
    local: BTreeMap<String, Vec<u8>>,
    remote: BTreeMap<String, Vec<u8>>,
    users: Vec<Value>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    store: Arc<Mutex<Store>>,
}

impl FakeBackend {
    pub async fn start() -> (MockServer, FakeBackend) {
        let server = MockServer::start().await;
        let backend = FakeBackend::default();
        Mock::given(any())
            .respond_with(backend.clone())
            .mount(&server)
            .await;
        (server, backend)
    }

    pub fn record_count(&self) -> usize {
        self.store.lock().unwrap().records.len()
    }

    pub fn users(&self) -> Vec<Value> {
        self.store.lock().unwrap().users.clone()
    }

    pub fn local_file(&self, name: &str) -> Option<Vec<u8>> {
        self.store.lock().unwrap().local.get(name).cloned()
    }

    pub fn remote_file(&self, name: &str) -> Option<Vec<u8>> {
        self.store.lock().unwrap().remote.get(name).cloned()
    }

    fn handle(&self, request: &Request) -> ResponseTemplate {
        let method = request.method.as_str().to_string();
        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|s| s.map(|p| decode(p)).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        // Every route hangs off /api.
        let Some((&"api", route)) = segments.split_first() else {
            return not_found("Not Found");
        };

        match (method.as_str(), route) {
            ("POST", ["auth", "token"]) => return self.login(request),
            ("POST", ["auth", "users", ""]) => return self.register(request),
            _ => {}
        }

        if !authorized(request) {
            return ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Could not validate credentials"}));
        }

        let mut store = self.store.lock().unwrap();
        match (method.as_str(), route) {
            ("GET", ["dummy"]) => {
                if store.records.is_empty() {
                    return not_found("Object not found");
                }
                let all: Vec<Value> = store.records.values().cloned().collect();
                ResponseTemplate::new(200).set_body_json(all)
            }
            ("POST", ["dummy"]) => {
                let body: Value = match serde_json::from_slice(&request.body) {
                    Ok(body) => body,
                    Err(_) => return ResponseTemplate::new(422),
                };
                let duplicate = store.records.values().any(|r| r["name"] == body["name"]);
                if duplicate {
                    return ResponseTemplate::new(400).set_body_json(json!({
                        "detail": format!("Record including name '{}' already exists", body["name"].as_str().unwrap_or_default())
                    }));
                }
                store.next_id += 1;
                let id = store.next_id;
                let record = json!({
                    "id": id,
                    "name": body["name"],
                    "description": body["description"],
                    "optional_field": body["optional_field"],
                });
                store.records.insert(id, record.clone());
                ResponseTemplate::new(201).set_body_json(record)
            }
            ("GET", ["dummy", id]) => match store.records.get(&parse_id(id)) {
                Some(record) => ResponseTemplate::new(200).set_body_json(record.clone()),
                None => not_found("Object not found"),
            },
            ("PUT", ["dummy", id]) | ("PATCH", ["dummy", id]) => {
                let patch = method == "PATCH";
                let Some(record) = store.records.get_mut(&parse_id(id)) else {
                    return not_found("Object not found");
                };
                let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
                for field in ["name", "description", "optional_field"] {
                    match body.get(field) {
                        Some(value) => record[field] = value.clone(),
                        None if !patch => record[field] = Value::Null,
                        None => {}
                    }
                }
                ResponseTemplate::new(200).set_body_json(record.clone())
            }
            ("DELETE", ["dummy", id]) => match store.records.remove(&parse_id(id)) {
                Some(_) => ResponseTemplate::new(204),
                None => not_found("Object not found"),
            },
            ("GET", [list @ ("list_local_files" | "list_s3_files")]) => {
                let files = bucket(&mut store, list.contains("s3"));
                let names: Vec<&String> = files.keys().collect();
                ResponseTemplate::new(200).set_body_json(json!({ "files": names }))
            }
            ("POST", [upload @ ("upload" | "uploads3")]) => {
                let Some((name, content)) = multipart_file(request) else {
                    return ResponseTemplate::new(422);
                };
                bucket(&mut store, *upload == "uploads3").insert(name.clone(), content);
                ResponseTemplate::new(200).set_body_json(json!({ "filename": name }))
            }
            ("GET", [download @ ("download" | "download_s3"), name]) => {
                match bucket(&mut store, *download == "download_s3").get(*name) {
                    Some(content) => ResponseTemplate::new(200).set_body_bytes(content.clone()),
                    None => not_found("File not found"),
                }
            }
            ("DELETE", [delete @ ("delete_local_file" | "delete_from_s3"), name]) => {
                match bucket(&mut store, *delete == "delete_from_s3").remove(*name) {
                    Some(_) => ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})),
                    None => not_found("File not found"),
                }
            }
            _ => not_found("Not Found"),
        }
    }

    fn login(&self, request: &Request) -> ResponseTemplate {
        let form = String::from_utf8_lossy(&request.body).to_string();
        let expected = format!("username={USERNAME}&password={PASSWORD}");
        if form == expected {
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": TOKEN, "token_type": "bearer"}))
        } else {
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Incorrect username or password"}))
        }
    }

    fn register(&self, request: &Request) -> ResponseTemplate {
        let Ok(user) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(422);
        };
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u["email"] == user["email"]) {
            return ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already exists"}));
        }
        store.users.push(user.clone());
        ResponseTemplate::new(200).set_body_json(user)
    }
}

impl Respond for FakeBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.handle(request)
    }
}

fn authorized(request: &Request) -> bool {
    request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn bucket(store: &mut Store, remote: bool) -> &mut BTreeMap<String, Vec<u8>> {
    if remote {
        &mut store.remote
    } else {
        &mut store.local
    }
}

// Unparsable ids map to one that is never assigned.
fn parse_id(id: &str) -> i64 {
    id.parse().unwrap_or(-1)
}

fn not_found(detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({ "detail": detail }))
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Pulls the single `file` part out of a multipart body.
fn multipart_file(request: &Request) -> Option<(String, Vec<u8>)> {
    let content_type = request.headers.get("content-type")?.to_str().ok()?;
    let boundary = content_type.split("boundary=").nth(1)?.trim_matches('"');
    let delimiter = format!("--{boundary}");
    let body = &request.body;

    let start = find(body, delimiter.as_bytes(), 0)? + delimiter.len() + 2;
    let header_end = find(body, b"\r\n\r\n", start)?;
    let headers = String::from_utf8_lossy(&body[start..header_end]).to_string();
    if !headers.contains("name=\"file\"") {
        return None;
    }
    // Names that need escaping arrive as `filename*=utf-8''<percent-encoded>`.
    let name = match headers.split("filename*=utf-8''").nth(1) {
        Some(encoded) => decode(encoded.split(['\r', ';']).next()?.trim()),
        None => headers
            .split("filename=\"")
            .nth(1)?
            .split('"')
            .next()?
            .to_string(),
    };

    let content_start = header_end + 4;
    let end_marker = format!("\r\n{delimiter}");
    let content_end = find(body, end_marker.as_bytes(), content_start)?;
    Some((name, body[content_start..content_end].to_vec()))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

pub fn api(server: &MockServer) -> ApiClient {
    ApiClient::from_url(&format!("{}/api", server.uri())).unwrap()
}

/// Console with an in-memory token store, optionally already signed in.
pub fn console(server: &MockServer, signed_in: bool) -> Console {
    let store = if signed_in {
        MemoryCredentialStore::with_token(TOKEN)
    } else {
        MemoryCredentialStore::new()
    };
    Console::with_store(api(server), Box::new(store)).unwrap()
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|r| r.len())
        .unwrap_or_default()
}
