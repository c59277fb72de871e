//! SecureCore Server
//!
//! Serves the admin, user and messaging REST APIs:
//! - Admin APIs: sign-in, users, forms, custom message, SMS broadcast
//! - User APIs: sign-in, feedback submission, emoji selection
//! - Health and Swagger UI
//!
//! Configuration is read from `config.toml` (or `SECURECORE_CONFIG`) and
//! environment variables; see `sc-config` for the full list.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | `5000` | HTTP API port |
//! | `MONGO_URI` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `SECRET_KEY` | - | HS256 signing secret (required) |
//! | `FAST2SMS_API_KEY` | - | Gateway API key |
//! | `FAST2SMS_SENDER_ID` / `FAST2SMS_TEMPLATE_ID` / `FAST2SMS_ENTITY_ID` | - | DLT registration |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_swagger_ui::SwaggerUi;

use sc_config::{AppConfig, ConfigLoader};
use sc_platform::admin::AdminState;
use sc_platform::auth::{Argon2Config, AuthConfig, AuthService, PasswordPolicy, PasswordService};
use sc_platform::messaging::MessagingState;
use sc_platform::shared::{health_router, initialize_indexes};
use sc_platform::user::UserState;
use sc_platform::{
    api_router, AdminRepository, AppState, AuthLayer, BootstrapAdminSeeder, FormRepository, UserRepository,
};
use sc_sms::{BroadcastConfig, BroadcastOrchestrator, Fast2SmsClient, SmsGateway, SmsGatewayConfig, TemplateCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    sc_common::logging::init_logging("sc-server");

    info!("Starting SecureCore Server");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    info!("Connecting to MongoDB: {}", config.mongodb.database);
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.uri).await?;
    let db = mongo_client.database(&config.mongodb.database);
    initialize_indexes(&db).await?;

    let admin_repo = Arc::new(AdminRepository::new(&db));
    let user_repo = Arc::new(UserRepository::new(&db));
    let form_repo = Arc::new(FormRepository::new(&db));
    info!("Repositories initialized");

    let auth_service = Arc::new(AuthService::new(AuthConfig::from(&config.auth)));
    let password_service = Arc::new(PasswordService::new(
        Argon2Config::default(),
        PasswordPolicy::with_min_length(config.auth.min_password_length),
    )?);

    let seeder = BootstrapAdminSeeder::new(admin_repo.clone(), password_service.clone());
    if let Err(e) = seeder
        .seed(
            config.auth.bootstrap_admin_username.as_deref(),
            config.auth.bootstrap_admin_password.as_deref(),
        )
        .await
    {
        warn!(error = %e, "Bootstrap admin seeding failed");
    }

    let gateway_config = SmsGatewayConfig::from(&config.sms);
    let missing = gateway_config.missing_credentials();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "DLT credentials incomplete; SMS sends will be rejected until they are configured"
        );
    }

    let catalog = Arc::new(TemplateCatalog::new(config.sms.templates.clone()));
    let gateway: Arc<dyn SmsGateway> = Arc::new(Fast2SmsClient::new(gateway_config, catalog.clone())?);
    let orchestrator = Arc::new(BroadcastOrchestrator::new(
        gateway.clone(),
        catalog.clone(),
        BroadcastConfig::from(&config.sms),
    ));
    info!(templates = catalog.len(), "SMS gateway initialized");

    let admin_state = AdminState {
        admin_repo,
        user_repo: user_repo.clone(),
        form_repo: form_repo.clone(),
        auth_service: auth_service.clone(),
        password_service: password_service.clone(),
    };
    let user_state = UserState {
        user_repo,
        form_repo,
        auth_service: auth_service.clone(),
        password_service,
        gateway: gateway.clone(),
        catalog: catalog.clone(),
    };
    let messaging_state = MessagingState {
        gateway,
        catalog,
        orchestrator,
        max_upload_bytes: config.http.max_upload_bytes,
    };

    let (router, openapi) = api_router(admin_state, user_state, messaging_state);

    let app = Router::new()
        .merge(router)
        .merge(health_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(AuthLayer::new(AppState { auth_service }))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    info!("API server listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SecureCore Server shutdown complete");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .http
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
