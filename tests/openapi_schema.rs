use serde_json::Value;

#[test]
fn openapi_documents_role_request_shapes() -> anyhow::Result<()> {
    // Build the OpenAPI document the same way the server does
    let doc = norseus_admin::docs::build_openapi(8000, false)?;
    let v = serde_json::to_value(&doc)?;

    let schema = |name: &str| -> Option<serde_json::Map<String, Value>> {
        v.get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get(name))
            .and_then(|t| t.get("properties"))
            .and_then(Value::as_object)
            .cloned()
    };

    let update = schema("UpdateRoleRequest").expect("components.schemas.UpdateRoleRequest.properties must exist");
    for k in ["roleId", "newRoleName", "newPermissions", "permissionsToDelete"] {
        assert!(update.contains_key(k), "UpdateRoleRequest schema missing '{}'", k);
    }

    let create = schema("CreateEmployeeRequest").expect("components.schemas.CreateEmployeeRequest.properties must exist");
    for k in ["email", "name", "roleId", "facilityId", "userType"] {
        assert!(create.contains_key(k), "CreateEmployeeRequest schema missing '{}'", k);
    }

    Ok(())
}

#[test]
fn openapi_lists_rpc_paths_with_bearer_auth() -> anyhow::Result<()> {
    let doc = norseus_admin::docs::build_openapi(8000, false)?;
    let v = serde_json::to_value(&doc)?;

    for path in [
        "/rpc/create-employee",
        "/rpc/delete-employee",
        "/rpc/create-role",
        "/rpc/update-role",
        "/rpc/delete-role",
    ] {
        assert!(v["paths"][path]["post"].is_object(), "missing POST {}", path);
    }
    assert_eq!(v["components"]["securitySchemes"]["bearerAuth"]["scheme"], "bearer");
    assert_eq!(v["servers"][0]["url"], "http://localhost:8000");
    Ok(())
}
