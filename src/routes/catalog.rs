use crate::envelope::Envelope;
use crate::models::access::PermissionCatalog;

#[utoipa::path(
    get,
    path = "/catalog/permissions",
    tag = "Catalog",
    responses((status = 200, description = "Sections and actions with display labels", body = PermissionCatalog)),
    security(())
)]
pub async fn permission_catalog() -> Envelope<PermissionCatalog> {
    Envelope::ok(PermissionCatalog::current())
}
