//! Integration tests for the generic viewset: overrides, hooks, actions and custom routes.

mod common;

use axum::http::StatusCode;
use axum::routing::get as get_route;
use axum::Router;
use common::{body_json, delete, get, post_empty, post_json, put_json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use viewset_sdk::entity::{Entity, EntityDescriptor, FieldDef, FieldKind, ValidationRule};
use viewset_sdk::response::{error, success};
use viewset_sdk::{ActionMethod, AppError, ConfigError, ViewRequest, ViewSet};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Product {
    id: Option<i64>,
    name: String,
    sku: String,
    price: f64,
    in_stock: bool,
}

impl Entity for Product {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("products")
            .resource("items")
            .field(FieldDef::new("name", FieldKind::Text).not_null())
            .field(FieldDef::new("sku", FieldKind::Text).unique())
            .field(FieldDef::new("price", FieldKind::Float))
            .field(FieldDef::new("in_stock", FieldKind::Bool))
            .rule("name", ValidationRule::required())
            .rule("price", ValidationRule::default().with_range(0.0, 10_000.0))
            .rule("sku", ValidationRule::default().with_pattern("^[A-Za-z0-9-]+$"))
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Coupon {
    id: Option<i64>,
    code: String,
}

impl Entity for Coupon {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("coupons")
            .field(FieldDef::new("code", FieldKind::Text))
            .rule("code", ValidationRule::default().with_pattern("[A-Z"))
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}

fn plain_app() -> Router {
    let items = ViewSet::<Product>::new(common::memory_store()).unwrap();
    Router::new().nest("/api", items.router())
}

fn hooked_app() -> Router {
    let items = ViewSet::<Product>::builder(common::memory_store())
        .before_create(|_, mut p: Product| async move {
            if p.sku.is_empty() {
                return Err(AppError::BadRequest("sku is required".into()));
            }
            p.sku = p.sku.to_uppercase();
            Ok(p)
        })
        .before_update(|_, _existing: Product, changes| async move {
            if changes.contains_key("sku") {
                return Err(AppError::Forbidden("sku cannot change".into()));
            }
            Ok(changes)
        })
        .before_destroy(|_, p: Product| async move {
            if p.in_stock {
                return Err(AppError::Forbidden("product still in stock".into()));
            }
            Ok(())
        })
        .build()
        .unwrap();
    Router::new().nest("/api", items.router())
}

async fn create(app: &Router, body: serde_json::Value) -> i64 {
    let response = post_json(app, "/api/items/", &body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn resource_segment_and_hard_delete() {
    let app = plain_app();
    let id = create(&app, json!({"name": "Pen", "sku": "p-1", "price": 1.5})).await;

    let json = body_json(get(&app, &format!("/api/items/{}", id)).await).await;
    assert_eq!(json["data"]["sku"], "p-1");
    assert_eq!(json["data"]["in_stock"], false);

    assert_eq!(delete(&app, &format!("/api/items/{}", id)).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &format!("/api/items/{}", id)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/products/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn filters_coerce_float_and_bool_values() {
    let app = plain_app();
    create(&app, json!({"name": "Pen", "sku": "a", "price": 1.5, "in_stock": true})).await;
    create(&app, json!({"name": "Ink", "sku": "b", "price": 9.5, "in_stock": true})).await;
    create(&app, json!({"name": "Pad", "sku": "c", "price": 9.5})).await;

    let json = body_json(get(&app, "/api/items/?price=9.5").await).await;
    assert_eq!(json["pagination"]["total"], 2);

    let json = body_json(get(&app, "/api/items/?price=9.5&in_stock=true").await).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["name"], "Ink");

    assert_eq!(get(&app, "/api/items/?in_stock=maybe").await.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(&app, "/api/items/?ordering=-price&page_size=1").await).await;
    assert_eq!(json["data"][0]["name"], "Ink");
    assert_eq!(json["pagination"], json!({"page": 1, "page_size": 1, "total": 3}));
}

#[tokio::test]
async fn range_rule_rejects_out_of_bounds_price() {
    let app = plain_app();
    let response = post_json(&app, "/api/items/", &json!({"name": "Gold", "price": 99999})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rule_pattern_rejects_mismatched_values() {
    let app = plain_app();
    let response = post_json(&app, "/api/items/", &json!({"name": "Pen", "sku": "bad sku!"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["msg"], "sku does not match required pattern");

    let id = create(&app, json!({"name": "Pen", "sku": "p-1"})).await;
    let response = put_json(&app, &format!("/api/items/{}", id), &json!({"sku": "p 2"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn broken_rule_pattern_fails_at_build_time() {
    let err = ViewSet::<Coupon>::new(common::memory_store()).err();
    assert!(matches!(err, Some(ConfigError::InvalidPattern { field, .. }) if field == "code"));
}

#[tokio::test]
async fn before_create_can_rewrite_or_reject() {
    let app = hooked_app();

    let response = post_json(&app, "/api/items/", &json!({"name": "Pen"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["msg"], "sku is required");

    let id = create(&app, json!({"name": "Pen", "sku": "abc"})).await;
    let json = body_json(get(&app, &format!("/api/items/{}", id)).await).await;
    assert_eq!(json["data"]["sku"], "ABC");

    let json = body_json(get(&app, "/api/items/").await).await;
    assert_eq!(json["pagination"]["total"], 1);
}

#[tokio::test]
async fn before_update_sees_only_changed_columns() {
    let app = hooked_app();
    let id = create(&app, json!({"name": "Pen", "sku": "abc"})).await;

    let response = put_json(&app, &format!("/api/items/{}", id), &json!({"sku": "xyz"})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], 403);

    let json = body_json(put_json(&app, &format!("/api/items/{}", id), &json!({"price": 2.25})).await).await;
    assert_eq!(json["data"]["price"], 2.25);
    assert_eq!(json["data"]["sku"], "ABC");
}

#[tokio::test]
async fn before_destroy_can_veto() {
    let app = hooked_app();
    let stocked = create(&app, json!({"name": "Pen", "sku": "a", "in_stock": true})).await;
    let sold_out = create(&app, json!({"name": "Ink", "sku": "b"})).await;

    let response = delete(&app, &format!("/api/items/{}", stocked)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(get(&app, &format!("/api/items/{}", stocked)).await.status(), StatusCode::OK);

    assert_eq!(delete(&app, &format!("/api/items/{}", sold_out)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn overridden_operations_reuse_generic_helpers() {
    let items = ViewSet::<Product>::builder(common::memory_store())
        .override_retrieve(|vs: ViewSet<Product>, req: ViewRequest| async move {
            let product = vs.get_object_or_404(req.id()?).await?;
            Ok(success(json!({ "label": format!("{} ({})", product.name, product.sku) })))
        })
        .override_destroy(|_, _| async move { Ok(error(405, "products are never deleted")) })
        .build()
        .unwrap();
    let app = Router::new().nest("/api", items.router());
    let id = create(&app, json!({"name": "Pen", "sku": "p-1"})).await;

    let json = body_json(get(&app, &format!("/api/items/{}", id)).await).await;
    assert_eq!(json["data"]["label"], "Pen (p-1)");
    assert_eq!(get(&app, "/api/items/77").await.status(), StatusCode::NOT_FOUND);

    // the unspecialized error path keeps HTTP 200 and reports the code in the body
    let response = delete(&app, &format!("/api/items/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["code"], 405);
    assert_eq!(json["msg"], "products are never deleted");

    // untouched operations keep the generic behavior
    let json = body_json(put_json(&app, &format!("/api/items/{}", id), &json!({"name": "Pencil"})).await).await;
    assert_eq!(json["data"]["name"], "Pencil");
}

#[tokio::test]
async fn actions_and_custom_route_registration() {
    let items = ViewSet::<Product>::builder(common::memory_store())
        .action(ActionMethod::Any, "/:id/touch", |vs: ViewSet<Product>, req: ViewRequest| async move {
            let product = vs.get_object_or_404(req.id()?).await?;
            Ok(success(json!({ "method": req.method.as_str(), "id": product.id })))
        })
        .routes(|vs| {
            vs.default_routes()
                .route("/items/ping", get_route(|| async { "pong" }))
        })
        .build()
        .unwrap();
    assert_eq!(items.actions().len(), 1);
    let app = Router::new().nest("/api", items.router());
    let id = create(&app, json!({"name": "Pen", "sku": "p-1"})).await;

    let json = body_json(post_empty(&app, &format!("/api/items/{}/touch", id)).await).await;
    assert_eq!(json["data"], json!({"method": "POST", "id": id}));
    let json = body_json(get(&app, &format!("/api/items/{}/touch", id)).await).await;
    assert_eq!(json["data"]["method"], "GET");

    let response = get(&app, "/api/items/ping").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn operations_can_be_driven_without_http() {
    let items = ViewSet::<Product>::new(common::memory_store()).unwrap();
    let created = items
        .perform_create(Product {
            name: "Pen".into(),
            sku: "p-1".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let id = created.id().unwrap();

    assert_eq!(items.get_object_or_404(id).await.unwrap().name, "Pen");
    assert!(matches!(
        items.get_object_or_404(id + 1).await,
        Err(AppError::NotFound(_))
    ));

    let response = items
        .list(ViewRequest::with_query("name=Pen"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["pagination"]["total"], 1);

    let response = items.destroy(ViewRequest::default().with_id(id)).await.unwrap();
    assert_eq!(body_json(response).await["data"]["message"], "deleted");
    assert_eq!(items.count(Default::default()).await.unwrap(), 0);
}
