use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, errors, models, routes};

/// Paths whose handlers answer with a bare JSON body instead of the envelope.
const UNWRAPPED_PATHS: &[&str] = &["/api/health"];

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::catalog::permission_catalog,
		routes::auth::login,
		routes::auth::accept_invite,
		routes::auth::me,
		routes::facilities::my_facilities,
		routes::facilities::my_permissions,
		routes::roles::list_roles,
		routes::roles::get_role,
		routes::roles::create_role,
		routes::roles::update_role,
		routes::roles::delete_role,
		routes::employees::list_employees,
		routes::employees::create_employee,
		routes::employees::delete_employee,
		routes::employees::update_employee
	),
	components(
		schemas(
			authz::Permission,
			authz::PermissionSection,
			authz::PermissionAction,
			errors::ErrorBody,
			models::access::EffectivePermissions,
			models::access::CatalogEntry,
			models::access::PermissionCatalog,
			models::facility::Facility,
			models::identity::UserType,
			models::identity::IdentityStatus,
			models::identity::LoginRequest,
			models::identity::AcceptInviteRequest,
			models::identity::AuthResponse,
			models::employee::Profile,
			models::employee::Employee,
			models::employee::EmployeeStatus,
			models::employee::EmployeeRef,
			models::employee::CreateEmployeeRequest,
			models::employee::DeleteEmployeeRequest,
			models::employee::UpdateEmployeeRequest,
			models::role::Role,
			models::role::RolePermission,
			models::role::PermissionInput,
			models::role::CreateRoleRequest,
			models::role::UpdateRoleRequest,
			models::role::DeleteRoleRequest,
			routes::MessageResponse,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Auth", description = "Login and invitation acceptance"),
		(name = "Roles", description = "Facility roles and their permissions"),
		(name = "Employees", description = "Employee provisioning and removal"),
		(name = "Facilities", description = "Facility membership and effective permissions"),
		(name = "Catalog", description = "Permission sections and actions"),
		(name = "Health", description = "Liveness")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16, tls: bool) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(&ApiDoc::openapi())?;
	let root = doc
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))?;

	normalize_path_operations(root);
	wrap_envelopes(root);
	ensure_security_components(root);
	ensure_global_security(root);
	add_examples(root);
	ensure_servers(root, port, tls);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn operations_mut(root: &mut Map<String, Value>) -> impl Iterator<Item = (&String, &mut Value)> {
	root.get_mut("paths")
		.and_then(Value::as_object_mut)
		.into_iter()
		.flat_map(|paths| paths.iter_mut())
		.filter_map(|(path, item)| item.as_object_mut().map(|ops| (path, ops)))
		.flat_map(|(path, ops)| ops.values_mut().map(move |op| (path, op)))
}

fn normalize_path_operations(root: &mut Map<String, Value>) {
	let Some(paths) = root.get_mut("paths").and_then(Value::as_object_mut) else { return; };

	for item in paths.values_mut() {
		let Some(ops) = item.as_object() else { continue; };
		let mut normalized = Map::new();
		for (method, val) in ops {
			let key = method.to_lowercase();
			if let Some(existing) = normalized.get_mut(&key) {
				merge_values(existing, val);
			} else {
				normalized.insert(key, val.clone());
			}
		}
		*item = Value::Object(normalized);
	}
}

/// Every documented body becomes the `data` member of the response envelope.
fn wrap_envelopes(root: &mut Map<String, Value>) {
	for (path, operation) in operations_mut(root) {
		if UNWRAPPED_PATHS.contains(&path.as_str()) {
			continue;
		}
		let Some(responses) = operation.get_mut("responses").and_then(Value::as_object_mut) else { continue; };

		for response in responses.values_mut() {
			let Some(response) = response.as_object_mut() else { continue; };
			let content = response
				.entry("content")
				.or_insert_with(|| json!({"application/json": {}}));
			let Some(app_json) = content.get_mut("application/json").and_then(Value::as_object_mut) else { continue; };
			let data = app_json.remove("schema");
			app_json.insert("schema".to_string(), envelope_schema(data));
		}
	}
}

fn envelope_schema(data: Option<Value>) -> Value {
	let mut properties = json!({
		"statusCode": {"type": "integer", "format": "int32", "example": 200},
		"error": {"$ref": "#/components/schemas/ErrorBody"}
	});
	if let Some(data) = data {
		properties["data"] = data;
	}
	json!({
		"type": "object",
		"required": ["statusCode"],
		"properties": properties
	})
}

fn ensure_security_components(root: &mut Map<String, Value>) {
	let components = root.entry("components").or_insert_with(|| Value::Object(Map::new()));
	let Some(components) = components.as_object_mut() else { return; };

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()));
	if let Some(schemes) = schemes.as_object_mut() {
		schemes.insert(
			"bearerAuth".to_string(),
			json!({
				"type": "http",
				"scheme": "bearer",
				"bearerFormat": "JWT"
			}),
		);
	}
}

fn ensure_global_security(root: &mut Map<String, Value>) {
	root.entry("security").or_insert_with(|| json!([{ "bearerAuth": [] }]));
}

fn add_examples(root: &mut Map<String, Value>) {
	for (_, operation) in operations_mut(root) {
		apply_request_examples(operation);
	}
}

fn apply_request_examples(operation: &mut Value) {
	let Some(app_json) = operation
		.get_mut("requestBody")
		.and_then(|body| body.get_mut("content"))
		.and_then(|content| content.get_mut("application/json"))
		.and_then(Value::as_object_mut)
	else {
		return;
	};

	let Some(r#ref) = app_json.get("schema").and_then(|s| s.get("$ref")).and_then(Value::as_str) else { return; };

	let example = match r#ref {
		"#/components/schemas/CreateRoleRequest" => Some(json!({
			"roleName": "front desk",
			"facilityId": "00000000-0000-0000-0000-000000000000",
			"permissions": [
				{"section": "employees", "action": "read"},
				{"section": "employees", "action": "create"}
			]
		})),
		"#/components/schemas/UpdateRoleRequest" => Some(json!({
			"roleId": "11111111-1111-1111-1111-111111111111",
			"newRoleName": "FRONT_DESK",
			"newPermissions": [
				{"id": 1, "section": "employees", "action": "read"},
				{"section": "roles", "action": "read"}
			],
			"permissionsToDelete": [2]
		})),
		"#/components/schemas/CreateEmployeeRequest" => Some(json!({
			"email": "coach@example.com",
			"name": "Ada Lovelace",
			"roleId": "11111111-1111-1111-1111-111111111111",
			"facilityId": "00000000-0000-0000-0000-000000000000",
			"userType": "user"
		})),
		"#/components/schemas/DeleteEmployeeRequest" => Some(json!({
			"userId": "22222222-2222-2222-2222-222222222222",
			"facilityId": "00000000-0000-0000-0000-000000000000"
		})),
		_ => None,
	};

	if let Some(example) = example {
		app_json.insert("example".to_string(), example);
	}
}

fn ensure_servers(root: &mut Map<String, Value>, port: u16, tls: bool) {
	let scheme = if tls { "https" } else { "http" };
	let server_url = format!("{}://localhost:{}", scheme, port);

	match root.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			root.insert("servers".to_string(), json!([{ "url": server_url }]));
		}
	}
}

fn merge_values(target: &mut Value, addition: &Value) {
	match (target, addition) {
		(Value::Object(dest), Value::Object(src)) => {
			for (key, value) in src {
				if let Some(existing) = dest.get_mut(key) {
					merge_values(existing, value);
				} else {
					dest.insert(key.clone(), value.clone());
				}
			}
		}
		(Value::Array(dest), Value::Array(src)) => {
			for item in src {
				if !dest.contains(item) {
					dest.push(item.clone());
				}
			}
		}
		_ => {}
	}
}
