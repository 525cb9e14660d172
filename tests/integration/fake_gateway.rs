//! In-memory stand-in for the RedisGate HTTP surface.
//!
//! Speaks the same wire shapes as the real gateway: enveloped management
//! responses, paginated lists, `{"result": ...}` data-plane replies, Bearer
//! or `?_token=` credentials. Individual routes can be made to fail so
//! teardown paths can be exercised.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Routes whose responses can be overridden with an error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(dead_code)]
pub enum FailRoute {
    Register,
    Login,
    CreateOrganization,
    CreateInstance,
    CreateApiKey,
    DeleteInstance,
    Flush,
}

pub struct FakeGateway {
    server: MockServer,
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(State::default()));

        Mock::given(any())
            .respond_with(Responder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    /// Makes `route` answer `status` until cleared.
    pub fn fail(&self, route: FailRoute, status: u16) {
        self.state.lock().failures.insert(route, status);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Holds every `/health` answer back by `delay`.
    pub fn delay_health(&self, delay: Duration) {
        self.state.lock().health_delay = Some(delay);
    }

    /// Answers resource creation with bare JSON instead of the envelope.
    pub fn raw_bodies(&self, raw: bool) {
        self.state.lock().raw = raw;
    }

    /// Every request seen so far, as `"METHOD /path"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Requests seen so far that changed state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("DELETE ") || c.starts_with("POST /redis/"))
            .collect()
    }

    pub fn created_organizations(&self) -> Vec<String> {
        self.state.lock().created_orgs.clone()
    }

    pub fn has_organization(&self, id: &str) -> bool {
        self.state.lock().orgs.contains_key(id)
    }

    pub fn has_instance(&self, id: &str) -> bool {
        self.state.lock().instances.contains_key(id)
    }

    pub fn key_count(&self, instance_id: &str) -> usize {
        self.state
            .lock()
            .data
            .get(instance_id)
            .map_or(0, HashMap::len)
    }
}

struct Responder {
    state: Arc<Mutex<State>>,
}

impl Respond for Responder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.state.lock().handle(request)
    }
}

struct User {
    json: Value,
    password: String,
}

struct ApiKey {
    org_id: String,
    secret: String,
    json: Value,
}

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    sessions: HashMap<String, String>,
    orgs: BTreeMap<String, Value>,
    instances: BTreeMap<String, Value>,
    keys: BTreeMap<String, ApiKey>,
    data: HashMap<String, HashMap<String, String>>,
    failures: HashMap<FailRoute, u16>,
    created_orgs: Vec<String>,
    calls: Vec<String>,
    raw: bool,
    health_delay: Option<Duration>,
}

impl State {
    fn handle(&mut self, request: &Request) -> ResponseTemplate {
        let method = request.method.as_str().to_string();
        self.calls.push(format!("{} {}", method, request.url.path()));

        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|parts| {
                parts
                    .filter(|p| !p.is_empty())
                    .map(|p| {
                        urlencoding::decode(p)
                            .map(|s| s.into_owned())
                            .unwrap_or_else(|_| p.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["health"]) => {
                let response = ResponseTemplate::new(200).set_body_json(json!({
                    "status": "ok",
                    "database": "healthy",
                    "timestamp": now(),
                }));
                match self.health_delay {
                    Some(delay) => response.set_delay(delay),
                    None => response,
                }
            }
            ("GET", ["version"]) => ResponseTemplate::new(200).set_body_json(json!({
                "name": "redisgate",
                "version": "0.1.0",
                "description": "Redis over HTTP gateway",
            })),
            ("POST", ["auth", "register"]) => self.register(&body),
            ("POST", ["auth", "login"]) => self.login(&body),
            (_, ["api", "organizations", rest @ ..]) => match self.authenticate(request) {
                Some(user_id) => self.organizations(&method, rest, &body, &user_id),
                None => fail(401, "Authentication required"),
            },
            (_, ["redis", instance_id, rest @ ..]) => {
                self.data_plane(request, &method, instance_id, rest, &body)
            }
            _ => fail(404, "Not found"),
        }
    }

    fn injected(&self, route: FailRoute) -> Option<ResponseTemplate> {
        self.failures
            .get(&route)
            .map(|&status| fail(status, &format!("injected failure for {:?}", route)))
    }

    fn ok(&self, status: u16, data: Value) -> ResponseTemplate {
        if self.raw {
            ResponseTemplate::new(status).set_body_json(data)
        } else {
            ResponseTemplate::new(status).set_body_json(json!({
                "success": true,
                "data": data,
                "message": null,
                "timestamp": now(),
            }))
        }
    }

    fn register(&mut self, body: &Value) -> ResponseTemplate {
        if let Some(failure) = self.injected(FailRoute::Register) {
            return failure;
        }
        let (Some(email), Some(username), Some(password)) = (
            str_field(body, "email"),
            str_field(body, "username"),
            str_field(body, "password"),
        ) else {
            return fail(400, "email, username and password are required");
        };
        if password.len() < 8 {
            return fail(400, "Password must be at least 8 characters");
        }
        let taken = self.users.contains_key(email)
            || self
                .users
                .values()
                .any(|u| u.json["username"] == json!(username));
        if taken {
            return fail(409, "User with this email or username already exists");
        }

        let user = json!({
            "id": Uuid::new_v4().to_string(),
            "email": email,
            "username": username,
            "created_at": now(),
        });
        self.users.insert(
            email.to_string(),
            User {
                json: user.clone(),
                password: password.to_string(),
            },
        );
        self.ok(201, json!({ "user": user }))
    }

    fn login(&mut self, body: &Value) -> ResponseTemplate {
        if let Some(failure) = self.injected(FailRoute::Login) {
            return failure;
        }
        let email = str_field(body, "email").unwrap_or_default();
        let password = str_field(body, "password").unwrap_or_default();
        let Some(user) = self.users.get(email).filter(|u| u.password == password) else {
            return fail(401, "Invalid email or password");
        };

        let token = format!("tok_{}", Uuid::new_v4().simple());
        let user_json = user.json.clone();
        let user_id = user_json["id"].as_str().unwrap_or_default().to_string();
        self.sessions.insert(token.clone(), user_id);
        self.ok(200, json!({ "token": token, "user": user_json }))
    }

    fn authenticate(&self, request: &Request) -> Option<String> {
        let header = request.headers.get("authorization")?.to_str().ok()?;
        let token = header.strip_prefix("Bearer ")?;
        self.sessions.get(token).cloned()
    }

    fn owned_org(&self, id: &str, user_id: &str) -> Option<&Value> {
        self.orgs
            .get(id)
            .filter(|org| org["owner_id"] == json!(user_id))
    }

    fn organizations(
        &mut self,
        method: &str,
        rest: &[&str],
        body: &Value,
        user_id: &str,
    ) -> ResponseTemplate {
        match (method, rest) {
            ("POST", []) => {
                if let Some(failure) = self.injected(FailRoute::CreateOrganization) {
                    return failure;
                }
                let (Some(name), Some(slug)) = (str_field(body, "name"), str_field(body, "slug"))
                else {
                    return fail(400, "name and slug are required");
                };
                if self.orgs.values().any(|o| o["slug"] == json!(slug)) {
                    return fail(409, "Organization slug already exists");
                }
                let id = Uuid::new_v4().to_string();
                let org = json!({
                    "id": id,
                    "name": name,
                    "slug": slug,
                    "description": body.get("description").cloned().unwrap_or(Value::Null),
                    "owner_id": user_id,
                    "created_at": now(),
                });
                self.orgs.insert(id.clone(), org.clone());
                self.created_orgs.push(id);
                self.ok(201, org)
            }
            ("GET", []) => {
                let items: Vec<Value> = self
                    .orgs
                    .values()
                    .filter(|o| o["owner_id"] == json!(user_id))
                    .cloned()
                    .collect();
                self.ok(200, paginated(items))
            }
            (_, [org_id, tail @ ..]) => {
                let org_id = org_id.to_string();
                if self.owned_org(&org_id, user_id).is_none() {
                    return fail(404, "Organization not found");
                }
                match (method, tail) {
                    ("GET", []) => self.ok(200, self.orgs[&org_id].clone()),
                    ("PUT", []) => {
                        let Some(org) = self.orgs.get_mut(&org_id) else {
                            return fail(404, "Organization not found");
                        };
                        if let Some(name) = str_field(body, "name") {
                            org["name"] = json!(name);
                        }
                        if let Some(description) = body.get("description") {
                            org["description"] = description.clone();
                        }
                        let org = org.clone();
                        self.ok(200, org)
                    }
                    ("DELETE", []) => {
                        let busy = self
                            .instances
                            .values()
                            .any(|i| i["organization_id"] == json!(org_id));
                        if busy {
                            return fail(409, "Cannot delete organization with active Redis instances");
                        }
                        self.orgs.remove(&org_id);
                        self.keys.retain(|_, k| k.org_id != org_id);
                        self.ok(200, Value::Null)
                    }
                    (_, ["redis-instances", rest @ ..]) => self.instances(method, &org_id, rest, body),
                    (_, ["api-keys", rest @ ..]) => self.api_keys(method, &org_id, rest, body),
                    _ => fail(404, "Not found"),
                }
            }
            _ => fail(404, "Not found"),
        }
    }

    fn instances(
        &mut self,
        method: &str,
        org_id: &str,
        rest: &[&str],
        body: &Value,
    ) -> ResponseTemplate {
        match (method, rest) {
            ("POST", []) => {
                if let Some(failure) = self.injected(FailRoute::CreateInstance) {
                    return failure;
                }
                let Some(name) = str_field(body, "name") else {
                    return fail(400, "name is required");
                };
                let id = Uuid::new_v4().to_string();
                let instance = json!({
                    "id": id,
                    "name": name,
                    "slug": body.get("slug").cloned().unwrap_or(Value::Null),
                    "organization_id": org_id,
                    "max_memory": body.get("max_memory").cloned().unwrap_or(json!(0)),
                    "status": "creating",
                    "created_at": now(),
                });
                self.instances.insert(id.clone(), instance.clone());
                self.data.insert(id, HashMap::new());
                self.ok(201, instance)
            }
            ("GET", []) => {
                let items: Vec<Value> = self
                    .instances
                    .values()
                    .filter(|i| i["organization_id"] == json!(org_id))
                    .cloned()
                    .collect();
                self.ok(200, paginated(items))
            }
            ("GET", [instance_id]) => match self.instance_in(org_id, instance_id) {
                Some(instance) => {
                    let mut instance = instance.clone();
                    instance["status"] = json!("running");
                    self.ok(200, instance)
                }
                None => fail(404, "Redis instance not found"),
            },
            ("DELETE", [instance_id]) => {
                if let Some(failure) = self.injected(FailRoute::DeleteInstance) {
                    return failure;
                }
                if self.instance_in(org_id, instance_id).is_none() {
                    return fail(404, "Redis instance not found");
                }
                self.instances.remove(*instance_id);
                self.data.remove(*instance_id);
                self.ok(200, Value::Null)
            }
            _ => fail(404, "Not found"),
        }
    }

    fn instance_in(&self, org_id: &str, instance_id: &str) -> Option<&Value> {
        self.instances
            .get(instance_id)
            .filter(|i| i["organization_id"] == json!(org_id))
    }

    fn api_keys(
        &mut self,
        method: &str,
        org_id: &str,
        rest: &[&str],
        body: &Value,
    ) -> ResponseTemplate {
        match (method, rest) {
            ("POST", []) => {
                if let Some(failure) = self.injected(FailRoute::CreateApiKey) {
                    return failure;
                }
                let Some(name) = str_field(body, "name") else {
                    return fail(400, "name is required");
                };
                let id = Uuid::new_v4().to_string();
                let secret = format!("rg_{}", Uuid::new_v4().simple());
                let key = json!({
                    "id": id,
                    "name": name,
                    "key_prefix": &secret[..8],
                    "organization_id": org_id,
                    "scopes": body.get("scopes").cloned().unwrap_or(json!([])),
                    "is_active": true,
                    "expires_at": null,
                });
                self.keys.insert(
                    id,
                    ApiKey {
                        org_id: org_id.to_string(),
                        secret: secret.clone(),
                        json: key.clone(),
                    },
                );
                self.ok(201, json!({ "api_key": key, "key": secret }))
            }
            ("GET", []) => {
                let items: Vec<Value> = self
                    .keys
                    .values()
                    .filter(|k| k.org_id == org_id)
                    .map(|k| k.json.clone())
                    .collect();
                self.ok(200, paginated(items))
            }
            ("DELETE", [key_id]) => {
                match self.keys.get(*key_id) {
                    Some(key) if key.org_id == org_id => {}
                    _ => return fail(404, "API key not found"),
                }
                self.keys.remove(*key_id);
                self.ok(200, Value::Null)
            }
            _ => fail(404, "Not found"),
        }
    }

    fn data_plane(
        &mut self,
        request: &Request,
        method: &str,
        instance_id: &str,
        rest: &[&str],
        body: &Value,
    ) -> ResponseTemplate {
        let Some(org_id) = self
            .instances
            .get(instance_id)
            .and_then(|i| i["organization_id"].as_str())
            .map(str::to_string)
        else {
            return redis_error(404, "Redis instance not found");
        };

        let token = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
            .or_else(|| {
                request
                    .url
                    .query_pairs()
                    .find(|(name, _)| name == "_token")
                    .map(|(_, value)| value.into_owned())
            });
        let authorized = token.is_some_and(|t| {
            self.keys
                .values()
                .any(|k| k.secret == t && k.org_id == org_id)
        });
        if !authorized {
            return redis_error(401, "Invalid or missing API key");
        }

        let args: Vec<String> = match (method, rest) {
            ("GET", [op, tail @ ..]) => {
                let mut args = vec![op.to_uppercase()];
                args.extend(tail.iter().map(|s| s.to_string()));
                if let Some((_, ex)) = request.url.query_pairs().find(|(name, _)| name == "EX") {
                    args.push("EX".to_string());
                    args.push(ex.into_owned());
                }
                args
            }
            ("POST", []) => match body.as_array() {
                Some(items) => items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                None => return redis_error(400, "Command body must be a JSON array"),
            },
            _ => return redis_error(404, "Not found"),
        };

        self.execute(instance_id, &args)
    }

    fn execute(&mut self, instance_id: &str, args: &[String]) -> ResponseTemplate {
        let command = args.first().map(|c| c.to_uppercase()).unwrap_or_default();
        if command == "FLUSHALL"
            && let Some(&status) = self.failures.get(&FailRoute::Flush)
        {
            return redis_error(status, "Redis command failed");
        }

        let store = self.data.entry(instance_id.to_string()).or_default();
        let result = match (command.as_str(), &args[1.min(args.len())..]) {
            ("PING", []) => json!("PONG"),
            ("SET", [key, value]) | ("SET", [key, value, _, _]) => {
                store.insert(key.clone(), value.clone());
                json!("OK")
            }
            ("GET", [key]) => store.get(key).map_or(Value::Null, |v| json!(v)),
            ("DEL", [key]) => json!(u64::from(store.remove(key).is_some())),
            ("FLUSHALL", []) => {
                store.clear();
                json!("OK")
            }
            _ => return redis_error(400, &format!("Unsupported command: {}", command)),
        };

        ResponseTemplate::new(200).set_body_json(json!({ "result": result }))
    }
}

fn str_field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn paginated(items: Vec<Value>) -> Value {
    json!({
        "total_count": items.len(),
        "page": 1,
        "limit": 50,
        "total_pages": 1,
        "items": items,
    })
}

fn fail(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "success": false,
        "data": null,
        "message": message,
        "timestamp": now(),
    }))
}

fn redis_error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "error": message }))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
