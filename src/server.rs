//! HTTP chat surface. The cascade is shared by every request; each session
//! keeps its own transcript behind its own lock.

use actix_web::{delete, get, post, web, App, HttpResponse, HttpServer, Responder};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cascade::Cascade;
use crate::session::Session;
use crate::stage::StageId;
use crate::transcript::TranscriptEntry;

#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub response: String,
    pub stage: StageId,
    pub label: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub struct SessionRegistry {
    cascade: Arc<Cascade>,
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new(cascade: Arc<Cascade>) -> Self {
        Self {
            cascade,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self) -> (Uuid, Arc<Mutex<Session>>) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(self.cascade.clone())));
        self.sessions.lock().insert(id, session.clone());
        log::info!("Started session {}", id);
        (id, session)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.lock().get(id).cloned()
    }

    /// Ends a session and drops its transcript. Returns false when no
    /// session has that id.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.lock().remove(id).is_some();
        if removed {
            log::info!("Ended session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[post("/chat")]
async fn chat_endpoint(
    req: web::Json<ChatRequest>,
    registry: web::Data<SessionRegistry>,
) -> impl Responder {
    let message = req.message.trim();
    if message.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("message must not be empty"));
    }

    let (session_id, session) = match req.session_id {
        Some(id) => match registry.get(&id) {
            Some(session) => (id, session),
            None => {
                return HttpResponse::NotFound()
                    .json(ErrorResponse::new(format!("unknown session {}", id)))
            }
        },
        None => registry.create(),
    };

    let reply = session.lock().turn(message);
    HttpResponse::Ok().json(ChatResponse {
        session_id,
        stage: reply.stage(),
        label: reply.verdict.label,
        response: reply.text,
    })
}

#[get("/sessions/{id}/transcript")]
async fn transcript_endpoint(
    path: web::Path<Uuid>,
    registry: web::Data<SessionRegistry>,
) -> impl Responder {
    let id = path.into_inner();
    match registry.get(&id) {
        Some(session) => {
            let entries: Vec<TranscriptEntry> = session.lock().transcript().all().to_vec();
            HttpResponse::Ok().json(entries)
        }
        None => HttpResponse::NotFound().json(ErrorResponse::new(format!("unknown session {}", id))),
    }
}

#[delete("/sessions/{id}")]
async fn end_session_endpoint(
    path: web::Path<Uuid>,
    registry: web::Data<SessionRegistry>,
) -> impl Responder {
    let id = path.into_inner();
    if registry.remove(&id) {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::NotFound().json(ErrorResponse::new(format!("unknown session {}", id)))
    }
}

/// Registers the chat routes; shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(chat_endpoint)
        .service(transcript_endpoint)
        .service(end_session_endpoint);
}

pub async fn run(cascade: Arc<Cascade>, host: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(SessionRegistry::new(cascade));

    log::info!("Starting server at http://{}:{}", host, port);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind((host, port))?
        .run()
        .await
}
