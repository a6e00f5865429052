//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use inwx_dns_provider::{
    CODE_AUTHENTICATION_ERROR, CODE_OBJECT_DOES_NOT_EXIST, CODE_OBJECT_EXISTS, InwxConfig,
    InwxProvider, MIN_TTL_SECS, NativeRecord, OtpGenerator, ProviderError, Record, RecordData,
    RemoteError, Result, RpcChannel, RpcConnector, SANDBOX_ENDPOINT, SvcParams,
};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("skipping: environment variable {} is not set", $var);
                return;
            }
        )+
    };
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 断言 `Option` 为 `Some`，并解包返回内部值。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "hunter2";
pub const ZONE: &str = "example.com.";
pub const DOMAIN: &str = "example.com";
pub const TTL: Duration = Duration::from_secs(300);

const CODE_PARAMETER_POLICY_ERROR: i64 = 2306;

// ============ In-memory DomRobot ============

#[derive(Default)]
struct ServerState {
    zones: HashMap<String, Vec<NativeRecord>>,
    next_id: u64,
    calls: Vec<String>,
    logins: usize,
    logouts: usize,
    open_sessions: usize,
    max_open_sessions: usize,
}

/// A stateful stand-in for the DomRobot API: zones hold records with
/// absolute names, ids are assigned on create, and record calls require a
/// logged-in channel.
#[derive(Clone, Default)]
pub struct FakeDomrobot {
    state: Arc<Mutex<ServerState>>,
    tan: Option<String>,
    stall: Arc<Mutex<Option<(String, Arc<Notify>)>>>,
}

impl FakeDomrobot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demands `account.unlock` with this code after every login.
    #[must_use]
    pub fn with_two_factor(mut self, tan: &str) -> Self {
        self.tan = Some(tan.to_string());
        self
    }

    #[must_use]
    pub fn with_zone(self, domain: &str) -> Self {
        self.lock().zones.insert(domain.to_string(), Vec::new());
        self
    }

    /// The next call of `method` never answers. The returned `Notify` fires
    /// once that call has arrived.
    pub fn stall_next(&self, method: &str) -> Arc<Notify> {
        let reached = Arc::new(Notify::new());
        *self.stall.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((method.to_string(), Arc::clone(&reached)));
        reached
    }

    fn take_stall(&self, method: &str) -> Option<Arc<Notify>> {
        let mut stall = self.stall.lock().unwrap_or_else(PoisonError::into_inner);
        match stall.as_ref() {
            Some((stalled, _)) if stalled == method => stall.take().map(|(_, reached)| reached),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a record as-is, bypassing validation. `name` is relative.
    pub fn seed(&self, domain: &str, name: &str, record_type: &str, content: &str, prio: u16) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id.to_string();
        let record = NativeRecord {
            id: id.clone(),
            name: absolute(name, domain),
            record_type: record_type.to_string(),
            content: content.to_string(),
            ttl: 3600,
            prio,
        };
        state.zones.entry(domain.to_string()).or_default().push(record);
        id
    }

    pub fn records(&self, domain: &str) -> Vec<NativeRecord> {
        self.lock().zones.get(domain).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn logins(&self) -> usize {
        self.lock().logins
    }

    pub fn logouts(&self) -> usize {
        self.lock().logouts
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    pub fn max_open_sessions(&self) -> usize {
        self.lock().max_open_sessions
    }
}

impl RpcConnector for FakeDomrobot {
    fn connect(&self) -> Result<Box<dyn RpcChannel>> {
        Ok(Box::new(FakeChannel {
            server: self.clone(),
            auth: Mutex::new(ChannelAuth::LoggedOut),
        }))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ChannelAuth {
    LoggedOut,
    AwaitingTan,
    LoggedIn,
}

struct FakeChannel {
    server: FakeDomrobot,
    auth: Mutex<ChannelAuth>,
}

impl FakeChannel {
    fn auth(&self) -> ChannelAuth {
        *self.auth.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_auth(&self, auth: ChannelAuth) {
        *self.auth.lock().unwrap_or_else(PoisonError::into_inner) = auth;
    }

    fn login(&self, params: &Value) -> Result<Value> {
        if params["user"] != USERNAME || params["pass"] != PASSWORD {
            return remote("account.login", CODE_AUTHENTICATION_ERROR, "Authentication error");
        }

        let mut state = self.server.lock();
        state.logins += 1;
        state.open_sessions += 1;
        state.max_open_sessions = state.max_open_sessions.max(state.open_sessions);
        drop(state);

        if self.server.tan.is_some() {
            self.set_auth(ChannelAuth::AwaitingTan);
            Ok(json!({ "customerId": 1, "accountId": 1, "tfa": "GOOGLE-AUTH" }))
        } else {
            self.set_auth(ChannelAuth::LoggedIn);
            Ok(json!({ "customerId": 1, "accountId": 1, "tfa": "0" }))
        }
    }

    fn unlock(&self, params: &Value) -> Result<Value> {
        if self.auth() != ChannelAuth::AwaitingTan
            || params["tan"].as_str() != self.server.tan.as_deref()
        {
            return remote("account.unlock", CODE_AUTHENTICATION_ERROR, "Authentication error");
        }
        self.set_auth(ChannelAuth::LoggedIn);
        Ok(Value::Null)
    }

    fn logout(&self) -> Result<Value> {
        if self.auth() != ChannelAuth::LoggedOut {
            let mut state = self.server.lock();
            state.logouts += 1;
            state.open_sessions -= 1;
        }
        self.set_auth(ChannelAuth::LoggedOut);
        Ok(Value::Null)
    }

    fn nameserver(&self, method: &str, params: &Value) -> Result<Value> {
        let mut state = self.server.lock();
        let domain = params["domain"].as_str().unwrap_or_default().to_string();

        match method {
            "nameserver.create" => {
                if state.zones.contains_key(&domain) {
                    return remote(method, CODE_OBJECT_EXISTS, "Object exists");
                }
                state.zones.insert(domain, Vec::new());
                Ok(Value::Null)
            }
            "nameserver.delete" => match state.zones.remove(&domain) {
                Some(_) => Ok(Value::Null),
                None => remote(method, CODE_OBJECT_DOES_NOT_EXIST, "Object does not exist"),
            },
            "nameserver.info" => {
                let Some(records) = state.zones.get(&domain) else {
                    return remote(method, CODE_OBJECT_DOES_NOT_EXIST, "Object does not exist");
                };
                let matching: Vec<&NativeRecord> = records
                    .iter()
                    .filter(|r| params["type"].as_str().is_none_or(|t| r.record_type == t))
                    .filter(|r| {
                        params["name"]
                            .as_str()
                            .is_none_or(|n| r.name.eq_ignore_ascii_case(n))
                    })
                    .filter(|r| params["content"].as_str().is_none_or(|c| r.content == c))
                    .collect();
                Ok(json!({
                    "roId": 1,
                    "domain": domain,
                    "type": "MASTER",
                    "count": matching.len(),
                    "record": matching.iter().map(|r| to_wire(r)).collect::<Vec<_>>(),
                }))
            }
            "nameserver.createRecord" => {
                let ttl = params["ttl"].as_u64().unwrap_or_default();
                if ttl < MIN_TTL_SECS {
                    return remote(method, CODE_PARAMETER_POLICY_ERROR, "Parameter value policy error");
                }
                let record = NativeRecord {
                    id: String::new(),
                    name: absolute(params["name"].as_str().unwrap_or_default(), &domain),
                    record_type: params["type"].as_str().unwrap_or_default().to_string(),
                    content: params["content"].as_str().unwrap_or_default().to_string(),
                    ttl,
                    prio: u16::try_from(params["prio"].as_u64().unwrap_or_default()).unwrap_or_default(),
                };

                state.next_id += 1;
                let id = state.next_id;
                let Some(records) = state.zones.get_mut(&domain) else {
                    return remote(method, CODE_OBJECT_DOES_NOT_EXIST, "Object does not exist");
                };
                let duplicate = records.iter().any(|r| {
                    r.name == record.name
                        && r.record_type == record.record_type
                        && r.content == record.content
                        && r.prio == record.prio
                });
                if duplicate {
                    return remote(method, CODE_OBJECT_EXISTS, "Object exists");
                }
                records.push(NativeRecord {
                    id: id.to_string(),
                    ..record
                });
                Ok(json!({ "id": id }))
            }
            "nameserver.updateRecord" => {
                let ttl = params["ttl"].as_u64().unwrap_or_default();
                if ttl < MIN_TTL_SECS {
                    return remote(method, CODE_PARAMETER_POLICY_ERROR, "Parameter value policy error");
                }
                let id = wire_id(&params["id"]);
                let Some((zone, record)) = state
                    .zones
                    .iter_mut()
                    .find_map(|(zone, records)| records.iter_mut().find(|r| r.id == id).map(|r| (zone.clone(), r)))
                else {
                    return remote(method, CODE_OBJECT_DOES_NOT_EXIST, "Object does not exist");
                };
                record.name = absolute(params["name"].as_str().unwrap_or_default(), &zone);
                record.content = params["content"].as_str().unwrap_or_default().to_string();
                record.ttl = ttl;
                record.prio = u16::try_from(params["prio"].as_u64().unwrap_or_default()).unwrap_or_default();
                Ok(Value::Null)
            }
            "nameserver.deleteRecord" => {
                let id = wire_id(&params["id"]);
                for records in state.zones.values_mut() {
                    if let Some(pos) = records.iter().position(|r| r.id == id) {
                        records.remove(pos);
                        return Ok(Value::Null);
                    }
                }
                remote(method, CODE_OBJECT_DOES_NOT_EXIST, "Object does not exist")
            }
            _ => remote(method, 2000, "Unknown command"),
        }
    }
}

#[async_trait]
impl RpcChannel for FakeChannel {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.server.lock().calls.push(method.to_string());
        tokio::task::yield_now().await;

        if let Some(reached) = self.server.take_stall(method) {
            reached.notify_one();
            std::future::pending::<()>().await;
        }

        match method {
            "account.login" => self.login(&params),
            "account.unlock" => self.unlock(&params),
            "account.logout" => self.logout(),
            _ if self.auth() != ChannelAuth::LoggedIn => {
                remote(method, CODE_AUTHENTICATION_ERROR, "Authentication error")
            }
            _ => self.nameserver(method, &params),
        }
    }
}

fn remote(method: &str, code: i64, msg: &str) -> Result<Value> {
    Err(ProviderError::Remote {
        provider: "inwx".to_string(),
        method: method.to_string(),
        error: RemoteError {
            code,
            message: msg.to_string(),
            reason_code: None,
            reason: None,
        },
    })
}

fn absolute(name: &str, domain: &str) -> String {
    if name.is_empty() || name == "@" {
        domain.to_string()
    } else {
        format!("{name}.{domain}")
    }
}

fn wire_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The API sends numeric ids.
fn to_wire(record: &NativeRecord) -> Value {
    json!({
        "id": record.id.parse::<u64>().unwrap_or_default(),
        "name": record.name,
        "type": record.record_type,
        "content": record.content,
        "ttl": record.ttl,
        "prio": record.prio,
    })
}

// ============ Providers ============

/// Always answers with the same code.
pub struct FixedOtp(pub &'static str);

impl OtpGenerator for FixedOtp {
    fn generate(&self, _shared_secret: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

pub fn fake_provider(fake: &FakeDomrobot, config: InwxConfig) -> Result<InwxProvider> {
    InwxProvider::builder(config)
        .connector(Arc::new(fake.clone()))
        .otp_generator(Arc::new(FixedOtp("123456")))
        .build()
}

pub fn default_config() -> InwxConfig {
    InwxConfig::new(USERNAME, PASSWORD)
}

/// Provider against the OTE sandbox, from `INWX_USERNAME`, `INWX_PASSWORD`
/// and optionally `INWX_SHARED_SECRET`.
pub fn live_provider() -> Option<(InwxProvider, String)> {
    let zone = env::var("ZONE").ok()?;
    let mut config = InwxConfig::from_env().ok()?;
    if config.endpoint_url.is_none() {
        config.endpoint_url = Some(SANDBOX_ENDPOINT.to_string());
    }
    let provider = InwxProvider::new(config).ok()?;
    Some((provider, zone))
}

// ============ Records ============

/// 测试记录集（TXT/MX/SRV/HTTPS）
pub fn scenario_records() -> Vec<Record> {
    vec![
        Record::txt("test_1", "test_value_1", TTL),
        Record::txt("test_2", "test_value_2", TTL),
        Record::txt("test_3", "test_value_3", TTL),
        Record::mx("test_4", 10, "mx.example.com", TTL),
        Record::new(
            "test_4",
            TTL,
            RecordData::SRV {
                service: "sip".to_string(),
                transport: "tcp".to_string(),
                priority: 0,
                weight: 5,
                port: 5060,
                target: "sipserver.example.com".to_string(),
            },
        ),
        Record::new(
            "test_5",
            TTL,
            RecordData::HTTPS {
                priority: 1,
                target: ".".to_string(),
                params: SvcParams(
                    [("alpn".to_string(), vec!["h3".to_string(), "h2".to_string()])]
                        .into_iter()
                        .collect(),
                ),
            },
        ),
    ]
}

/// Same `(type, name, data, ttl)`, ignoring ids.
pub fn same_rr(lhs: &Record, rhs: &Record) -> bool {
    lhs.rr() == rhs.rr()
}

pub fn contains_rr(records: &[Record], wanted: &Record) -> bool {
    records.iter().any(|r| same_rr(r, wanted))
}
