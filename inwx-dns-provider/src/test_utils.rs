//! Scripted RPC channel for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProviderError, RemoteError, Result};
use crate::providers::PROVIDER_ID;
use crate::traits::{OtpGenerator, RpcChannel};

type Script = VecDeque<(&'static str, Result<Value>)>;

/// Calls seen by a [`ScriptedChannel`], in order.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<(String, Value)>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    fn push(&self, method: &str, params: Value) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((method.to_string(), params));
    }
}

/// Answers each call with the next scripted response, provided the method
/// matches. Out-of-script calls fail with `InvalidParameter`.
pub(crate) struct ScriptedChannel {
    script: Mutex<Script>,
    log: CallLog,
}

impl ScriptedChannel {
    pub fn new(script: Vec<(&'static str, Result<Value>)>) -> (Self, CallLog) {
        let log = CallLog::default();
        let channel = Self {
            script: Mutex::new(script.into()),
            log: log.clone(),
        };
        (channel, log)
    }
}

#[async_trait]
impl RpcChannel for ScriptedChannel {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.log.push(method, params);

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some((expected, response)) if expected == method => response,
            Some((expected, _)) => Err(unscripted(format!("expected {expected}, got {method}"))),
            None => Err(unscripted(format!("script exhausted, got {method}"))),
        }
    }
}

fn unscripted(detail: String) -> ProviderError {
    ProviderError::InvalidParameter {
        provider: "scripted".to_string(),
        param: "method".to_string(),
        detail,
    }
}

/// Successful `resData`.
pub(crate) fn ok(res_data: Value) -> Result<Value> {
    Ok(res_data)
}

/// A non-success envelope as the channel would report it.
pub(crate) fn remote_error(method: &str, code: i64, msg: &str) -> Result<Value> {
    Err(ProviderError::Remote {
        provider: PROVIDER_ID.to_string(),
        method: method.to_string(),
        error: RemoteError {
            code,
            message: msg.to_string(),
            reason_code: None,
            reason: None,
        },
    })
}

/// Always returns the same code.
pub(crate) struct FixedOtp(String);

impl FixedOtp {
    pub fn new(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl OtpGenerator for FixedOtp {
    fn generate(&self, _shared_secret: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
