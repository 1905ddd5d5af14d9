use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::EngineConfig;
use crate::directory::{MemorySpaceDirectory, MemoryUserDirectory};
use crate::engine::{Engine, EngineError};
use crate::model::{Space, Status, UserProfile};
use crate::store::MemoryStore;

/// The engine plus the admin-writable side of its in-memory collaborators.
/// Space and user lifecycle is not the engine's business; the put ops exist
/// so a deployment (and the tests) can seed the directories.
pub struct Service {
    engine: Engine,
    spaces: Arc<MemorySpaceDirectory>,
    users: Arc<MemoryUserDirectory>,
}

impl Service {
    pub fn in_memory(config: EngineConfig) -> Self {
        let spaces = Arc::new(MemorySpaceDirectory::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let engine = Engine::new(
            Arc::new(MemoryStore::new()),
            spaces.clone(),
            users.clone(),
            config,
        );
        Self {
            engine,
            spaces,
            users,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// One structured request, however it arrived. `op` picks the operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    #[serde(rename = "reserve", rename_all = "camelCase")]
    Reserve {
        space_id: String,
        user_id: String,
        date: String,
        hours: Vec<u8>,
        #[serde(default)]
        status: Option<String>,
    },
    #[serde(rename = "checkAvailability", rename_all = "camelCase")]
    CheckAvailability {
        space_id: String,
        date: String,
        hours: Vec<u8>,
    },
    #[serde(rename = "cancel", rename_all = "camelCase")]
    Cancel {
        space_id: String,
        slot_timestamp: String,
        user_id: String,
    },
    #[serde(rename = "updateStatus", rename_all = "camelCase")]
    UpdateStatus {
        space_id: String,
        slot_timestamp: String,
        status: String,
        hoster_id: String,
    },
    #[serde(rename = "listByUser", rename_all = "camelCase")]
    ListByUser { user_id: String },
    #[serde(rename = "listByHoster", rename_all = "camelCase")]
    ListByHoster {
        hoster_id: String,
        #[serde(default)]
        status: Option<String>,
    },
    #[serde(rename = "putSpace")]
    PutSpace { space: Space },
    #[serde(rename = "putUser")]
    PutUser { user: UserProfile },
}

/// Outcome envelope: 200 success, 4xx client error, 5xx server error.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn client_error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Classify an engine error into the outcome envelope. Messages pass through
/// verbatim; they carry no internals.
pub fn error_response(e: &EngineError) -> ApiResponse {
    let status = match e {
        EngineError::Validation(_) => 400,
        EngineError::NotFound(_) => 404,
        EngineError::Conflict { .. } => 409,
        EngineError::Dependency(_) => 502,
    };
    ApiResponse {
        status,
        body: json!({ "message": e.to_string() }),
    }
}

fn ok_with_message(message: &str, payload: impl Serialize) -> ApiResponse {
    let mut body = serde_json::to_value(payload).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut body {
        map.insert("message".into(), Value::String(message.into()));
    }
    ApiResponse::ok(body)
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiResponse> {
    raw.parse()
        .map_err(|_| ApiResponse::client_error(400, "invalid date, expected YYYY-MM-DD"))
}

fn parse_status(raw: &str) -> Result<Status, ApiResponse> {
    Status::parse(raw)
        .ok_or_else(|| ApiResponse::client_error(400, &format!("unknown status {raw}")))
}

pub async fn dispatch(service: &Service, request: Request) -> ApiResponse {
    match request {
        Request::Reserve {
            space_id,
            user_id,
            date,
            hours,
            status,
        } => {
            let date = match parse_date(&date) {
                Ok(d) => d,
                Err(resp) => return resp,
            };
            let status = match status.as_deref().map(parse_status).transpose() {
                Ok(s) => s.unwrap_or_default(),
                Err(resp) => return resp,
            };
            match service
                .engine
                .reserve(&space_id, &user_id, date, &hours, status)
                .await
            {
                Ok(receipt) => ok_with_message("reservation recorded", receipt),
                Err(e) => error_response(&e),
            }
        }
        Request::CheckAvailability {
            space_id,
            date,
            hours,
        } => {
            let date = match parse_date(&date) {
                Ok(d) => d,
                Err(resp) => return resp,
            };
            match service
                .engine
                .check_availability(&space_id, date, &hours)
                .await
            {
                Ok(availability) => {
                    ApiResponse::ok(serde_json::to_value(availability).unwrap_or(Value::Null))
                }
                Err(e) => error_response(&e),
            }
        }
        Request::Cancel {
            space_id,
            slot_timestamp,
            user_id,
        } => match service
            .engine
            .cancel(&space_id, &slot_timestamp, &user_id)
            .await
        {
            Ok(receipt) => ok_with_message("reservation canceled", receipt),
            Err(e) => error_response(&e),
        },
        Request::UpdateStatus {
            space_id,
            slot_timestamp,
            status,
            hoster_id,
        } => match service
            .engine
            .update_status(&space_id, &slot_timestamp, &status, &hoster_id)
            .await
        {
            Ok(updated) => ApiResponse::ok(serde_json::to_value(updated).unwrap_or(Value::Null)),
            Err(e) => error_response(&e),
        },
        Request::ListByUser { user_id } => match service.engine.list_by_user(&user_id).await {
            Ok(records) => ApiResponse::ok(serde_json::to_value(records).unwrap_or(Value::Null)),
            Err(e) => error_response(&e),
        },
        Request::ListByHoster { hoster_id, status } => {
            let filter = match status.as_deref().map(parse_status).transpose() {
                Ok(f) => f,
                Err(resp) => return resp,
            };
            match service.engine.list_by_hoster(&hoster_id, filter).await {
                Ok(items) => ApiResponse::ok(serde_json::to_value(items).unwrap_or(Value::Null)),
                Err(e) => error_response(&e),
            }
        }
        Request::PutSpace { space } => {
            if space.space_id.is_empty() {
                return ApiResponse::client_error(400, "spaceId is required");
            }
            service.spaces.put(space);
            ApiResponse::ok(json!({ "message": "space recorded" }))
        }
        Request::PutUser { user } => {
            if user.user_id.is_empty() {
                return ApiResponse::client_error(400, "userId is required");
            }
            service.users.put(user);
            ApiResponse::ok(json!({ "message": "user recorded" }))
        }
    }
}
