//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    AnalyticsService, ApiKeyService, ConversationService, IdentityService, PropertyService,
};
use crate::config::PaginationConfig;
use crate::domain::{RepositoryProvider, SessionStore};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{ApiResponse, EmptyData, PaginatedResponse, PaginationMetaDto};
use crate::interfaces::http::middleware::{
    auth_middleware, require_access, require_admin, require_ingest, AuthState,
};
use crate::interfaces::http::modules::request_id::request_id_middleware;

use super::modules::{
    analytics, api_keys, auth, conversations, health, ingest, metrics, properties, users,
};

/// Everything the HTTP layer needs, built once at startup
#[derive(Clone)]
pub struct ApiContext {
    pub db: DatabaseConnection,
    pub identity: Arc<IdentityService>,
    pub api_keys: Arc<ApiKeyService>,
    pub properties: Arc<PropertyService>,
    pub conversations: Arc<ConversationService>,
    pub analytics: Arc<AnalyticsService>,
    pub sessions: Arc<dyn SessionStore>,
    pub pagination: PaginationConfig,
    /// `None` leaves `/metrics` unrouted
    pub metrics: Option<PrometheusHandle>,
}

impl ApiContext {
    pub fn new(
        db: DatabaseConnection,
        repos: Arc<dyn RepositoryProvider>,
        sessions: Arc<dyn SessionStore>,
        jwt_config: JwtConfig,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            db,
            identity: Arc::new(IdentityService::new(repos.clone(), jwt_config)),
            api_keys: Arc::new(ApiKeyService::new(repos.clone())),
            properties: Arc::new(PropertyService::new(repos.clone())),
            conversations: Arc::new(ConversationService::new(repos.clone(), sessions.clone())),
            analytics: Arc::new(AnalyticsService::new(repos)),
            sessions,
            pagination,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    fn auth_state(&self) -> AuthState {
        AuthState {
            identity: self.identity.clone(),
            api_keys: self.api_keys.clone(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Agent JWT from /api/v1/auth/login"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::get_current_user,
        auth::change_password,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // API Keys
        api_keys::create_api_key,
        api_keys::list_api_keys,
        api_keys::revoke_api_key,
        // Properties
        properties::list_properties,
        properties::get_property,
        properties::create_property,
        properties::update_property,
        properties::update_property_status,
        properties::delete_property,
        // Conversations
        conversations::list_conversations,
        conversations::get_conversation,
        conversations::list_messages,
        conversations::reply,
        conversations::assign,
        conversations::escalate,
        conversations::resolve,
        conversations::close,
        conversations::get_session,
        conversations::reset_session,
        // Ingest
        ingest::ingest_message,
        // Analytics
        analytics::get_summary,
        analytics::get_activity,
    ),
    components(
        schemas(
            // Common
            ApiResponse<EmptyData>,
            EmptyData,
            PaginationMetaDto,
            PaginatedResponse<users::UserDto>,
            PaginatedResponse<properties::PropertyDto>,
            PaginatedResponse<conversations::ConversationDto>,
            PaginatedResponse<conversations::MessageDto>,
            // Health
            health::HealthResponse,
            health::ComponentHealth,
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::ChangePasswordRequest,
            // Users
            users::UserDto,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            // API Keys
            api_keys::CreateApiKeyRequest,
            api_keys::ApiKeyResponse,
            api_keys::CreatedApiKeyResponse,
            // Properties
            properties::PropertyDto,
            properties::CreatePropertyRequest,
            properties::UpdatePropertyRequest,
            properties::UpdateStatusRequest,
            // Conversations
            conversations::ConversationDto,
            conversations::AgentSummaryDto,
            conversations::MessageDto,
            conversations::SessionDto,
            conversations::EscalationDto,
            conversations::ReplyRequest,
            conversations::AssignRequest,
            conversations::EscalateRequest,
            // Ingest
            ingest::IngestMessageRequest,
            ingest::IngestResponse,
            // Analytics
            analytics::AnalyticsSummary,
            analytics::StatusCount,
            analytics::DailyActivityDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service and dependency health"),
        (name = "Authentication", description = "Agent login (JWT), current agent, password change"),
        (name = "Users", description = "Agent account management (admin only)"),
        (name = "API Keys", description = "Keys for integrations such as the WhatsApp assistant (admin only)"),
        (name = "Properties", description = "Property listings"),
        (name = "Conversations", description = "Customer conversations, agent takeover and assistant sessions"),
        (name = "Ingest", description = "Message intake from the WhatsApp assistant (API key with 'ingest' scope)"),
        (name = "Analytics", description = "Dashboard summary and daily activity"),
    ),
    info(
        title = "Realty Admin API",
        version = "1.0.0",
        description = "Admin portal backend for a WhatsApp real-estate sales assistant",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(ctx: ApiContext) -> Router {
    let auth_state = ctx.auth_state();

    let auth_handler_state = auth::AuthHandlerState {
        identity: ctx.identity.clone(),
    };

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .with_state(auth_handler_state.clone());

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::get_current_user))
        .route("/change-password", put(auth::change_password))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(auth_handler_state);

    // User routes (admin)
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(users::UserHandlerState {
            identity: ctx.identity.clone(),
            pagination: ctx.pagination,
        });

    // API Key routes (admin)
    let api_key_routes = Router::new()
        .route(
            "/",
            get(api_keys::list_api_keys).post(api_keys::create_api_key),
        )
        .route("/{id}", axum::routing::delete(api_keys::revoke_api_key))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(api_keys::ApiKeyHandlerState {
            api_keys: ctx.api_keys.clone(),
        });

    // Property routes (protected)
    let property_routes = Router::new()
        .route(
            "/",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/{id}",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
        .route("/{id}/status", put(properties::update_property_status))
        .layer(middleware::from_fn(require_access))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(properties::PropertyHandlerState {
            properties: ctx.properties.clone(),
            pagination: ctx.pagination,
        });

    // Conversation routes (protected)
    let conversation_routes = Router::new()
        .route("/", get(conversations::list_conversations))
        .route("/{id}", get(conversations::get_conversation))
        .route(
            "/{id}/messages",
            get(conversations::list_messages).post(conversations::reply),
        )
        .route("/{id}/assign", put(conversations::assign))
        .route("/{id}/escalate", post(conversations::escalate))
        .route("/{id}/resolve", post(conversations::resolve))
        .route("/{id}/close", post(conversations::close))
        .route("/{id}/session", get(conversations::get_session))
        .route("/{id}/session/reset", post(conversations::reset_session))
        .layer(middleware::from_fn(require_access))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(conversations::ConversationHandlerState {
            conversations: ctx.conversations.clone(),
            identity: ctx.identity.clone(),
            pagination: ctx.pagination,
        });

    // Ingest routes (API key with 'ingest' scope)
    let ingest_routes = Router::new()
        .route("/messages", post(ingest::ingest_message))
        .layer(middleware::from_fn(require_ingest))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(ingest::IngestHandlerState {
            conversations: ctx.conversations.clone(),
        });

    // Analytics routes (protected)
    let analytics_routes = Router::new()
        .route("/summary", get(analytics::get_summary))
        .route("/activity", get(analytics::get_activity))
        .layer(middleware::from_fn(require_access))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(analytics::AnalyticsHandlerState {
            analytics: ctx.analytics.clone(),
        });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db: ctx.db.clone(),
            sessions: ctx.sessions.clone(),
            started_at: Arc::new(Instant::now()),
        });

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .merge(health_routes)
        // Auth
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/auth", auth_protected_routes)
        // Users
        .nest("/api/v1/users", user_routes)
        // API Keys
        .nest("/api/v1/api-keys", api_key_routes)
        // Properties
        .nest("/api/v1/properties", property_routes)
        // Conversations
        .nest("/api/v1/conversations", conversation_routes)
        // Ingest
        .nest("/api/v1/ingest", ingest_routes)
        // Analytics
        .nest("/api/v1/analytics", analytics_routes);

    if let Some(handle) = ctx.metrics {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    // Middleware
    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AdminConfig;
    use crate::domain::api_key::{SCOPE_INGEST, SCOPE_READ};
    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::test_db;
    use crate::infrastructure::session::MemorySessionStore;

    struct TestApp {
        router: Router,
        ctx: ApiContext,
        sessions: Arc<MemorySessionStore>,
    }

    async fn app() -> TestApp {
        let db = test_db().await;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let sessions = Arc::new(MemorySessionStore::new());
        let mut ctx = ApiContext::new(
            db,
            repos.clone(),
            sessions.clone(),
            JwtConfig::new("router-test-secret", 1),
            PaginationConfig::default(),
        );
        ctx.identity = Arc::new(
            IdentityService::new(repos, JwtConfig::new("router-test-secret", 1)).with_hash_cost(4),
        );
        ctx.identity
            .ensure_default_admin(&AdminConfig::default())
            .await
            .unwrap();

        TestApp {
            router: create_api_router(ctx.clone()),
            ctx,
            sessions,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }

        async fn admin_token(&self) -> String {
            let admin = AdminConfig::default();
            let (status, body) = self
                .send(json_request(
                    "POST",
                    "/api/v1/auth/login",
                    None,
                    json!({"username": admin.username, "password": admin.password}),
                ))
                .await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            body["data"]["token"].as_str().unwrap().to_string()
        }

        async fn api_key(&self, scope: &str) -> String {
            self.ctx
                .api_keys
                .create("assistant", vec![scope.to_string()], None, None)
                .await
                .unwrap()
                .key
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn ingest(phone: &str, body: &str) -> Value {
        json!({
            "customer_phone": phone,
            "customer_name": "Ana",
            "direction": "inbound",
            "sender": "customer",
            "body": body,
        })
    }

    #[tokio::test]
    async fn protected_routes_need_credentials() {
        let app = app().await;

        let (status, body) = app
            .send(Request::builder().uri("/api/v1/properties").body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = app.send(get("/api/v1/properties", "not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"username": "admin", "password": "wrong-password"}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn property_listing_paginates() {
        let app = app().await;
        let token = app.admin_token().await;

        for i in 0..25 {
            let (status, _) = app
                .send(json_request(
                    "POST",
                    "/api/v1/properties",
                    Some(&token),
                    json!({
                        "title": format!("Flat {}", i),
                        "property_type": "apartment",
                        "listing_type": "sale",
                        "price": 100_000 + i,
                        "currency": "EUR",
                        "city": "Valencia"
                    }),
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = app
            .send(get("/api/v1/properties?page=2&limit=20&sort_by=price&sort_order=asc", &token))
            .await;
        assert_eq!(status, StatusCode::OK);
        let page = &body["data"];
        assert_eq!(page["items"].as_array().unwrap().len(), 5);
        assert_eq!(page["items"][0]["price"], 100_020);
        assert_eq!(
            page["pagination"],
            json!({"page": 2, "limit": 20, "total": 25, "total_pages": 2, "has_more": false})
        );

        let (status, _) = app.send(get("/api/v1/properties?sort_by=description", &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.send(get("/api/v1/properties?limit=500", &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.send(get("/api/v1/properties?page=0", &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_bodies_are_rejected_before_the_service() {
        let app = app().await;
        let token = app.admin_token().await;

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/properties",
                Some(&token),
                json!({
                    "title": "",
                    "property_type": "apartment",
                    "listing_type": "sale",
                    "price": -1,
                    "currency": "EUR",
                    "city": "Valencia"
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("price"));

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/properties",
                Some(&token),
                json!({
                    "title": "Castle",
                    "property_type": "castle",
                    "listing_type": "sale",
                    "price": 1,
                    "currency": "EUR",
                    "city": "Valencia"
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_then_escalate_mirrors_into_session() {
        let app = app().await;
        let token = app.admin_token().await;
        let key = app.api_key(SCOPE_INGEST).await;

        let mut request = json_request("POST", "/api/v1/ingest/messages", None, ingest("34600111222", "hola"));
        request.headers_mut().insert("x-api-key", key.parse().unwrap());
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["created"], true);
        let id = body["data"]["conversation"]["id"].as_i64().unwrap();

        // Ingest keys cannot read the inbox
        let mut request = Request::builder()
            .uri("/api/v1/conversations")
            .body(Body::empty())
            .unwrap();
        request.headers_mut().insert("x-api-key", key.parse().unwrap());
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/conversations/{}/escalate", id),
                Some(&token),
                json!({"reason": "wants a visit"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "escalated");
        assert!(body["data"]["assigned_agent"]["username"].is_string());

        let (status, body) = app
            .send(get(&format!("/api/v1/conversations/{}/session", id), &token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"], "ESCALATED");
        assert_eq!(body["data"]["escalation"]["reason"], "wants a visit");

        let (status, _) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/conversations/{}/escalate", id),
                Some(&token),
                json!({"reason": "again"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/conversations/{}/session/reset", id),
                Some(&token),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["state"], "ACTIVE");
        assert!(body["data"]["escalation"].is_null());
        assert_eq!(app.sessions.len(), 1);
    }

    #[tokio::test]
    async fn agent_reply_and_message_listing() {
        let app = app().await;
        let token = app.admin_token().await;
        let outcome = app
            .ctx
            .conversations
            .ingest(crate::application::IngestMessage {
                customer_phone: "34600999888".into(),
                customer_name: None,
                direction: crate::domain::MessageDirection::Inbound,
                sender: crate::domain::MessageSender::Customer,
                body: "hello".into(),
                whatsapp_message_id: None,
                sent_at: None,
            })
            .await
            .unwrap();
        let id = outcome.conversation.id;

        let (status, body) = app
            .send(json_request(
                "POST",
                &format!("/api/v1/conversations/{}/messages", id),
                Some(&token),
                json!({"body": "An agent will call you today"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["sender"], "agent");

        let (status, body) = app
            .send(get(&format!("/api/v1/conversations/{}/messages", id), &token))
            .await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["sender"], "customer");
        assert_eq!(items[1]["sender"], "agent");

        let (status, _) = app
            .send(get("/api/v1/conversations/9999/messages", &token))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_routes_reject_agents_and_read_keys() {
        let app = app().await;
        let admin = app.admin_token().await;

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/users",
                Some(&admin),
                json!({"username": "maria", "email": "maria@example.com", "password": "maria-pass-1"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["role"], "agent");

        let (_, body) = app
            .send(json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"username": "maria@example.com", "password": "maria-pass-1"}),
            ))
            .await;
        let agent = body["data"]["token"].as_str().unwrap().to_string();

        let (status, _) = app.send(get("/api/v1/users", &agent)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(get("/api/v1/properties", &agent)).await;
        assert_eq!(status, StatusCode::OK);

        let key = app.api_key(SCOPE_READ).await;
        let mut request = json_request(
            "POST",
            "/api/v1/properties",
            None,
            json!({"title": "x", "property_type": "land", "listing_type": "sale", "price": 1, "currency": "EUR", "city": "Madrid"}),
        );
        request.headers_mut().insert("x-api-key", key.parse().unwrap());
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut request = Request::builder()
            .uri("/api/v1/analytics/summary")
            .body(Body::empty())
            .unwrap();
        request.headers_mut().insert("x-api-key", key.parse().unwrap());
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_properties"], 0);
    }

    #[tokio::test]
    async fn health_and_openapi_are_public() {
        let app = app().await;

        let (status, body) = app
            .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["session_store"]["backend"], "memory");

        let (status, body) = app
            .send(Request::builder().uri("/api-doc/openapi.json").body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/ingest/messages"].is_object());
        assert!(body["components"]["securitySchemes"]["api_key"].is_object());
    }
}
