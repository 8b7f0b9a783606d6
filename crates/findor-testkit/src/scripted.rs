use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use findor_core::api_key::{ApiKeyListItem, CreatedApiKey, StatusResponse};
use findor_service::{KeyService, ServiceError};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateUser,
    CreateKey,
    List,
    Delete,
}

type Outcome<T> = Result<T, u16>;

#[derive(Default)]
struct Script {
    create_user: VecDeque<Outcome<StatusResponse>>,
    create_key: VecDeque<Outcome<CreatedApiKey>>,
    list: VecDeque<Outcome<Vec<ApiKeyListItem>>>,
    delete: VecDeque<Outcome<StatusResponse>>,
    default_list: Vec<ApiKeyListItem>,
    calls: HashMap<Op, usize>,
    deleted: Vec<String>,
    emails: Vec<String>,
}

/// A `KeyService` whose answers are queued up front.
///
/// Unqueued calls fall back to defaults: `create_user` fails with 400
/// (user exists), `list_api_keys` returns the default list, `delete_api_key`
/// succeeds, and `create_api_key` fails with 500. Any op can be held
/// in flight with [`ScriptedKeyService::hold`] until released.
#[derive(Default)]
pub struct ScriptedKeyService {
    script: Mutex<Script>,
    gates: Mutex<HashMap<Op, Arc<Semaphore>>>,
}

impl ScriptedKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_list(self, items: Vec<ApiKeyListItem>) -> Self {
        self.script.lock().unwrap().default_list = items;
        self
    }

    pub fn push_create_user(&self, outcome: Outcome<StatusResponse>) {
        self.script.lock().unwrap().create_user.push_back(outcome);
    }

    pub fn push_create_key(&self, outcome: Outcome<CreatedApiKey>) {
        self.script.lock().unwrap().create_key.push_back(outcome);
    }

    pub fn push_list(&self, outcome: Outcome<Vec<ApiKeyListItem>>) {
        self.script.lock().unwrap().list.push_back(outcome);
    }

    pub fn push_delete(&self, outcome: Outcome<StatusResponse>) {
        self.script.lock().unwrap().delete.push_back(outcome);
    }

    pub fn set_default_list(&self, items: Vec<ApiKeyListItem>) {
        self.script.lock().unwrap().default_list = items;
    }

    pub fn calls(&self, op: Op) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Secrets passed to `delete_api_key`, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.script.lock().unwrap().deleted.clone()
    }

    /// Emails seen by any call, in call order.
    pub fn emails(&self) -> Vec<String> {
        self.script.lock().unwrap().emails.clone()
    }

    /// Park every subsequent call of `op` until [`release`](Self::release).
    pub fn hold(&self, op: Op) {
        self.gates
            .lock()
            .unwrap()
            .insert(op, Arc::new(Semaphore::new(0)));
    }

    /// Let one parked (or future) call of `op` through.
    pub fn release(&self, op: Op) {
        if let Some(gate) = self.gates.lock().unwrap().get(&op) {
            gate.add_permits(1);
        }
    }

    async fn enter(&self, op: Op, email: &str) {
        {
            let mut script = self.script.lock().unwrap();
            *script.calls.entry(op).or_default() += 1;
            script.emails.push(email.to_string());
        }
        let gate = self.gates.lock().unwrap().get(&op).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

fn outcome<T>(next: Option<Outcome<T>>, fallback: impl FnOnce() -> Outcome<T>) -> Result<T, ServiceError> {
    next.unwrap_or_else(fallback)
        .map_err(|status| ServiceError::Http { status })
}

#[async_trait]
impl KeyService for ScriptedKeyService {
    async fn create_user(&self, email: &str) -> Result<StatusResponse, ServiceError> {
        self.enter(Op::CreateUser, email).await;
        let next = self.script.lock().unwrap().create_user.pop_front();
        outcome(next, || Err(400))
    }

    async fn create_api_key(&self, email: &str) -> Result<CreatedApiKey, ServiceError> {
        self.enter(Op::CreateKey, email).await;
        let next = self.script.lock().unwrap().create_key.pop_front();
        outcome(next, || Err(500))
    }

    async fn list_api_keys(&self, email: &str) -> Result<Vec<ApiKeyListItem>, ServiceError> {
        self.enter(Op::List, email).await;
        let mut script = self.script.lock().unwrap();
        let next = script.list.pop_front();
        let fallback = script.default_list.clone();
        drop(script);
        outcome(next, || Ok(fallback))
    }

    async fn delete_api_key(
        &self,
        email: &str,
        key: &str,
    ) -> Result<StatusResponse, ServiceError> {
        self.enter(Op::Delete, email).await;
        let next = {
            let mut script = self.script.lock().unwrap();
            script.deleted.push(key.to_string());
            script.delete.pop_front()
        };
        outcome(next, || {
            Ok(StatusResponse {
                status_code: 200,
                message: "API key deleted".into(),
            })
        })
    }
}
