use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{DefaultPolicyEvaluator, PermissionChecker};
use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::identity::{IdentityProvider, LogNotifier, SqliteIdentityProvider};
use crate::jwt::JwtConfig;
use crate::routes::{auth, catalog, employees, facilities, health, roles};
use crate::services::{EmployeeLifecycle, RoleService};
use crate::settings::Settings;
use crate::stores::{EmployeeStore, RoleStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub settings: Arc<Settings>,
    pub event_bus: EventBus,
    pub checker: PermissionChecker,
    pub roles: RoleService,
    pub employees: EmployeeLifecycle,
}

impl AppState {
    /// Wires the default SQLite identity provider with log-only invitations.
    /// Must be called inside a Tokio runtime; it spawns the activity listener.
    pub fn new(pool: SqlitePool, jwt: JwtConfig, settings: Settings) -> Self {
        let identity: Arc<dyn IdentityProvider> = Arc::new(SqliteIdentityProvider::new(
            pool.clone(),
            Arc::new(LogNotifier::new()),
            settings.invite_redirect_url.clone(),
        ));
        Self::with_identity_provider(pool, jwt, settings, identity)
    }

    pub fn with_identity_provider(
        pool: SqlitePool,
        jwt: JwtConfig,
        settings: Settings,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (event_bus, rx) = init_event_bus();
        tokio::spawn(start_activity_listener(rx, pool.clone()));

        let role_store = RoleStore::new(pool.clone(), settings.role_name_policy);
        let employee_store = EmployeeStore::new(pool.clone());
        let checker = PermissionChecker::new(
            employee_store.clone(),
            role_store.clone(),
            Arc::new(DefaultPolicyEvaluator::new()),
        );

        let roles = RoleService::new(role_store.clone(), checker.clone(), event_bus.clone());
        let employees = EmployeeLifecycle::new(
            employee_store,
            role_store,
            checker.clone(),
            identity,
            event_bus.clone(),
            settings.employee_delete_mode,
        );

        Self {
            pool,
            jwt: Arc::new(jwt),
            settings: Arc::new(settings),
            event_bus,
            checker,
            roles,
            employees,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let settings = Settings::from_env()?;
    Ok(router(AppState::new(pool, jwt_config, settings)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/accept-invite", post(auth::accept_invite))
        .route("/me", get(auth::me));

    let rpc_routes = Router::new()
        .route("/create-employee", post(employees::create_employee))
        .route("/delete-employee", post(employees::delete_employee))
        .route("/update-employee", post(employees::update_employee))
        .route("/create-role", post(roles::create_role))
        .route("/update-role", post(roles::update_role))
        .route("/delete-role", post(roles::delete_role));

    let facility_routes = Router::new()
        .route("/roles", get(roles::list_roles))
        .route("/roles/:role_id", get(roles::get_role))
        .route("/employees", get(employees::list_employees))
        .route("/permissions/me", get(facilities::my_permissions));

    Router::new()
        .route("/api/health", get(health::health))
        .route("/catalog/permissions", get(catalog::permission_catalog))
        .route("/me/facilities", get(facilities::my_facilities))
        .nest("/auth", auth_routes)
        .nest("/rpc", rpc_routes)
        .nest("/facilities/:facility_id", facility_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
