use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::{require_admin, require_member};
use crate::state::AppState;

/// Full router: public routes plus every entity group behind its role guard.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .nest("/activity", activity_routes(&state))
        .nest("/area", area_routes(&state))
        .nest("/audit", audit_routes(&state))
        .nest("/category", category_routes(&state))
        .nest("/checklist", checklist_routes(&state))
        .nest("/location", location_routes(&state))
        .nest("/question", question_routes(&state))
        .nest("/task", task_routes(&state))
        .nest("/user", user_routes(&state))
        .nest("/report", report_routes(&state));

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let allow_origin = if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    Some(CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any))
}

fn activity_routes(state: &AppState) -> Router<AppState> {
    use protected::activity;

    Router::new()
        .route("/list/all", get(activity::activity_list_all))
        .route("/list/filter", get(activity::activity_list_filter))
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn area_routes(state: &AppState) -> Router<AppState> {
    use protected::area;

    Router::new()
        .route("/add", post(area::area_add))
        .route("/list/all", get(area::area_list_all))
        .route("/list/filter", get(area::area_list_filter))
        .route("/status/:id", put(area::area_status))
        .route(
            "/:id",
            get(area::area_details).put(area::area_update).delete(area::area_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn audit_routes(state: &AppState) -> Router<AppState> {
    use protected::audit;

    Router::new()
        .route("/add", post(audit::audit_add))
        .route("/list/all", get(audit::audit_list_all))
        .route("/list/filter", get(audit::audit_list_filter))
        .route("/history/list/all", get(audit::audit_history))
        .route("/report/all", get(audit::audit_report_all))
        .route("/report/area/:area", get(audit::audit_report_area))
        .route("/status/:id", put(audit::audit_status))
        .route(
            "/:id",
            get(audit::audit_details).put(audit::audit_update).delete(audit::audit_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn category_routes(state: &AppState) -> Router<AppState> {
    use protected::category;

    Router::new()
        .route("/add", post(category::category_add))
        .route("/list/all", get(category::category_list_all))
        .route("/list/filter", get(category::category_list_filter))
        .route("/status/:id", put(category::category_status))
        .route(
            "/:id",
            get(category::category_details)
                .put(category::category_update)
                .delete(category::category_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn checklist_routes(state: &AppState) -> Router<AppState> {
    use protected::checklist;

    Router::new()
        .route("/add", post(checklist::checklist_add))
        .route("/list/all", get(checklist::checklist_list_all))
        .route("/status/:id", put(checklist::checklist_status))
        .route(
            "/:id",
            get(checklist::checklist_details)
                .put(checklist::checklist_update)
                .delete(checklist::checklist_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn location_routes(state: &AppState) -> Router<AppState> {
    use protected::location;

    Router::new()
        .route("/add", post(location::location_add))
        .route("/list/all", get(location::location_list_all))
        .route("/list/filter", get(location::location_list_filter))
        .route("/status/:id", put(location::location_status))
        .route(
            "/:id",
            get(location::location_details)
                .put(location::location_update)
                .delete(location::location_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn question_routes(state: &AppState) -> Router<AppState> {
    use protected::question;

    Router::new()
        .route("/add", post(question::question_add))
        .route("/list/all", get(question::question_list_all))
        .route("/list/all/v2", get(question::question_list_all_v2))
        .route("/status/:id", put(question::question_status))
        .route(
            "/:id",
            get(question::question_details)
                .put(question::question_update)
                .delete(question::question_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn task_routes(state: &AppState) -> Router<AppState> {
    use protected::task;

    Router::new()
        .route("/add", post(task::task_add))
        .route("/list/all", get(task::task_list_all))
        .route("/list/filter", get(task::task_list_filter))
        .route("/status/:id", put(task::task_status))
        .route(
            "/:id",
            get(task::task_details).put(task::task_update).delete(task::task_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use protected::user;

    // Both halves register "/:id"; merge joins their methods on that path.
    let admin = Router::new()
        .route("/add", post(user::user_add))
        .route("/add/admin", post(user::user_add_admin))
        .route("/list/all", get(user::user_list_all))
        .route("/list/filter", get(user::user_list_filter))
        .route("/reports", get(user::user_reports))
        .route("/:id", put(user::user_update))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let member = Router::new()
        .route("/profile/me", get(user::user_profile))
        .route("/profile/update", put(user::user_profile_update))
        .route("/download/:id", get(user::user_download))
        .route("/status/:id", put(user::user_status))
        .route("/:id", get(user::user_details).delete(user::user_delete))
        .route_layer(from_fn_with_state(state.clone(), require_member));

    admin.merge(member)
}

fn report_routes(state: &AppState) -> Router<AppState> {
    use protected::report;

    Router::new()
        .route("/list/counter", get(report::report_counter))
        .route_layer(from_fn_with_state(state.clone(), require_member))
}

#[cfg(test)]
mod tests {
    use crate::auth::Role;
    use crate::database::{Collection, DocumentStore};
    use crate::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn health_and_root_are_public() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], json!(false));
        assert_eq!(body["data"]["database"], json!("ok"));

        let (status, body) = app.call(Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], json!("Auditor API"));
    }

    #[tokio::test]
    async fn guards_answer_with_auth_envelope() {
        let app = TestApp::new();

        let (status, body) = app.call(Method::GET, "/area/list/all", None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": true, "auth": false, "message": "No token provided."}));

        let (status, body) = app.get("/area/list/all", "garbage").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], json!("Failed to authenticate token."));

        let (_, token) = app.user(Role::User);
        let (status, body) = app.get("/user/list/all", &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["auth"], json!(false));
    }

    #[tokio::test]
    async fn invalid_page_is_rejected_before_storage() {
        let app = TestApp::new();
        let (_, token) = app.user(Role::User);
        let before = app.store.calls();

        for uri in ["/area/list/filter?page=0&limit=10", "/task/list/filter?limit=10", "/audit/list/filter?page=-1&limit=5&standard=ISO"] {
            let (status, body) = app.get(uri, &token).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body, json!({"error": true, "message": "common.invalid.page.number"}));
        }
        assert_eq!(app.store.calls(), before);
    }

    #[tokio::test]
    async fn area_lifecycle_is_owner_scoped() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let (_, other_token) = app.user(Role::User);
        let location = app.store.seed(Collection::Locations, json!({"name": "HQ", "status": 1, "created_by": me.to_string()}));

        let new_area = json!({"title": "Main Kitchen", "type": "kitchen", "location": location["id"]});
        let (status, body) = app.call(Method::POST, "/area/add", Some(&token), Some(new_area.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("area.add.success"));
        let area_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = app.call(Method::POST, "/area/add", Some(&token), Some(new_area)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("area.title.exist"));

        let (status, body) = app.get("/area/list/filter?page=1&limit=10&search=kitchen", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], json!(1));
        assert_eq!(body["data"]["currentPage"], json!(1));
        assert_eq!(body["data"]["data"][0]["location"]["name"], json!("HQ"));

        let (_, body) = app.get("/area/list/filter?page=1&limit=10", &other_token).await;
        assert_eq!(body["data"]["count"], json!(0));
        assert_eq!(body["data"]["pages"], json!(0));

        let (status, body) = app.get(&format!("/area/{}", area_id), &other_token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("area.not.found"));

        app.store.seed(Collection::Audits, json!({"area": area_id, "status": 1, "created_by": me.to_string()}));
        let (status, body) = app.call(Method::DELETE, &format!("/area/{}", area_id), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("area.delete.has.audits"));
    }

    #[tokio::test]
    async fn area_add_logs_activity() {
        let app = TestApp::new();
        let (_, token) = app.user(Role::User);
        let body = json!({"title": "Cellar", "type": "storage", "location": uuid::Uuid::new_v4().to_string()});
        let (status, _) = app.call(Method::POST, "/area/add", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        for _ in 0..100 {
            if !app.store.all(Collection::Activities).is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let logged = app.store.all(Collection::Activities);
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0]["type"], json!("NEW_AREA"));
        assert_eq!(logged[0]["title"], json!("Cellar"));
    }

    #[tokio::test]
    async fn unverified_users_cannot_add() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let changes = json!({"verified": false}).as_object().cloned().unwrap();
        app.store.update_by_id(Collection::Users, me, changes).await.unwrap();

        let body = json!({"title": "Bar", "type": "bar", "location": uuid::Uuid::new_v4().to_string()});
        let (status, body) = app.call(Method::POST, "/area/add", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("user.not.verified"));
    }

    #[tokio::test]
    async fn task_filter_with_non_positive_limit_returns_everything() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        for i in 0..3 {
            app.store.seed(
                Collection::Tasks,
                json!({"task": format!("Fix {}", i), "priority": "High", "status": 1, "archived": false, "created_by": me.to_string()}),
            );
        }

        let (status, body) = app.get("/task/list/filter?page=1&limit=0&priority=hig&archived=false", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], json!(3));
        assert_eq!(body["data"]["pages"], json!(1));
        assert_eq!(body["data"]["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn audit_filter_requires_standard() {
        let app = TestApp::new();
        let (_, token) = app.user(Role::User);
        let (status, body) = app.get("/audit/list/filter?page=1&limit=10", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("audit.list.standard.required"));
    }

    #[tokio::test]
    async fn audit_add_then_report() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let category = app.store.seed(Collection::Categories, json!({"name": "Hygiene", "status": 1}));
        let question = app.store.seed(Collection::Questions, json!({"question": "Clean?", "category": category["id"], "status": 1}));
        let area = app.store.seed(Collection::Areas, json!({"title": "Kitchen", "status": 1, "created_by": me.to_string()}));

        let audit = json!({"area": area["id"], "scores": [
            {"question": question["id"], "score": 2.5},
            {"question": question["id"], "score": 1.5}
        ]});
        let (status, body) = app.call(Method::POST, "/audit/add", Some(&token), Some(audit)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        let (status, body) = app.get("/audit/report/all", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], json!(4.0));
        assert_eq!(
            body["data"]["audits"],
            json!([{"category": category["id"], "categoryName": "Hygiene", "totalScore": 4.0}])
        );
        assert_eq!(body["data"]["userId"], json!(me.to_string()));

        let uri = format!("/audit/report/area/{}", uuid::Uuid::new_v4());
        let (_, body) = app.get(&uri, &token).await;
        assert_eq!(body["data"]["audits"], json!([]));
    }

    #[tokio::test]
    async fn counter_and_admin_reports() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let (_, admin) = app.user(Role::Admin);
        app.store.seed(Collection::Locations, json!({"name": "HQ", "status": 1, "created_by": me.to_string()}));

        let (status, body) = app.get("/report/list/counter", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"audits": 0, "locations": 1, "areas": 0}));

        let (status, body) = app.get("/user/reports", &admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], json!(2));
        assert_eq!(body["data"]["verified"], json!(2));
    }

    #[tokio::test]
    async fn status_update_needs_a_value() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let location = app.store.seed(Collection::Locations, json!({"name": "HQ", "status": 1, "created_by": me.to_string()}));
        let uri = format!("/location/status/{}", location["id"].as_str().unwrap());

        let (status, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("common.status.required"));

        let (status, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"status": 0}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], json!(0));

        let (_, body) = app.get("/location/list/all?status=all", &token).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let (_, body) = app.get("/location/list/all", &token).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn deactivated_audit_is_still_listed_and_counted() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let area = app.store.seed(Collection::Areas, json!({"title": "Dock", "status": 1, "created_by": me.to_string()}));
        let question = app.store.seed(Collection::Questions, json!({"question": "Clear?", "status": 1}));

        let audit = json!({"area": area["id"], "scores": [{"question": question["id"], "score": 1}]});
        let (status, body) = app.call(Method::POST, "/audit/add", Some(&token), Some(audit)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let audit_id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/audit/status/{}", audit_id);
        let (status, _) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"status": 0}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = app.get("/audit/list/all", &token).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let history = format!("/audit/history/list/all?area_id={}", area["id"].as_str().unwrap());
        let (_, body) = app.get(&history, &token).await;
        assert_eq!(body["data"][0]["id"], json!(audit_id));
        let (_, body) = app.get("/report/list/counter", &token).await;
        assert_eq!(body["data"]["audits"], json!(1));
        let (_, body) = app.get("/audit/list/all?status=1", &token).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn admins_list_every_checklist_users_only_their_own() {
        let app = TestApp::new();
        let (_, first_admin) = app.user(Role::Admin);
        let (_, second_admin) = app.user(Role::Admin);
        let (_, user) = app.user(Role::User);

        let (status, body) =
            app.call(Method::POST, "/checklist/add", Some(&first_admin), Some(json!({"name": "Warehouse 5S", "code": "WH"}))).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["standard"], json!("5s"));
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/checklist/status/{}", id);
        let (status, _) = app.call(Method::PUT, &uri, Some(&first_admin), Some(json!({"status": 0}))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = app.get("/checklist/list/all", &second_admin).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], json!(id));

        let (_, body) = app.get("/checklist/list/all", &user).await;
        assert_eq!(body["data"], json!([]));
        let (status, _) = app.get(&format!("/checklist/{}", id), &user).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn checklist_edits_stay_with_their_author() {
        let app = TestApp::new();
        let (_, token) = app.user(Role::User);
        let (_, other) = app.user(Role::User);
        let new_checklist = json!({"name": "Kitchen", "is_short": true});

        let (_, body) = app.call(Method::POST, "/checklist/add", Some(&token), Some(new_checklist.clone())).await;
        let uri = format!("/checklist/{}", body["data"]["id"].as_str().unwrap());
        let (status, body) = app.call(Method::POST, "/checklist/add", Some(&token), Some(new_checklist)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("checklist.name.exist"));

        let (_, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"name": " "}))).await;
        assert_eq!(body["message"], json!("checklist.name.required"));
        let (status, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"version": "2"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("checklist.update.success"));
        assert_eq!(body["data"]["name"], json!("Kitchen"));
        assert_eq!(body["data"]["version"], json!("2"));

        let (_, body) = app.call(Method::DELETE, &uri, Some(&other), None).await;
        assert_eq!(body["message"], json!("checklist.not.found"));
        let (status, body) = app.call(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("checklist.delete.success"));
        assert!(app.store.all(Collection::Checklists).is_empty());
    }

    #[tokio::test]
    async fn questions_are_managed_and_listed_per_checklist() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let checklist = app.store.seed(Collection::Checklists, json!({"code": "5S", "name": "5S", "status": 1, "created_by": me.to_string()}));
        let shine = app.store.seed(Collection::Categories, json!({"name": "S3", "priority": 3, "description": "Shine", "status": 1}));
        let sort = app.store.seed(Collection::Categories, json!({"name": "S1", "priority": 1, "status": 1}));

        let (status, body) = app.call(Method::POST, "/question/add", Some(&token), Some(json!({"question": "Clean?"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("question.category.required"));

        let mut ids = Vec::new();
        for (text, category, order) in [("Floor?", &shine, 2), ("Labels?", &sort, 1)] {
            let question = json!({"question": text, "category": category["id"], "checklist": checklist["id"],
                                  "example": "-", "max_points": 5, "order": order});
            let (status, body) = app.call(Method::POST, "/question/add", Some(&token), Some(question)).await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            ids.push(body["data"]["id"].as_str().unwrap().to_string());
        }

        let (_, body) = app.get("/question/list/all?checklist=5S", &token).await;
        assert_eq!(body["data"][0]["categoryName"], json!("S1"));
        assert_eq!(body["data"][0]["questions"][0]["question"], json!("Labels?"));
        assert_eq!(body["data"][1]["categoryDescription"], json!("Shine"));
        let (_, body) = app.get("/question/list/all?checklist=nope", &token).await;
        assert_eq!(body["message"], json!("common.list.all.not.exist"));
        let (status, _) = app.get("/question/list/all", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let v2 = format!("/question/list/all/v2?checklist={}", checklist["id"].as_str().unwrap());
        let (_, body) = app.get(&v2, &token).await;
        assert_eq!(body["data"][0]["question"], json!("Labels?"));
        assert_eq!(body["data"][1]["category"]["name"], json!("S3"));
        let unknown = format!("/question/list/all/v2?checklist={}", uuid::Uuid::new_v4());
        let (status, body) = app.get(&unknown, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("common.list.all.not.exist"));

        let uri = format!("/question/{}", ids[0]);
        let (_, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"question": ""}))).await;
        assert_eq!(body["message"], json!("question.question.required"));
        let (_, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"order": 9}))).await;
        assert_eq!(body["data"]["order"], json!(9));
        let (status, _) = app.call(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.all(Collection::Questions).len(), 1);
    }

    #[tokio::test]
    async fn audit_update_checks_the_new_area() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let area = app.store.seed(Collection::Areas, json!({"title": "Dock", "status": 1, "created_by": me.to_string()}));
        let foreign = app.store.seed(Collection::Areas, json!({"title": "Yard", "status": 1, "created_by": uuid::Uuid::new_v4().to_string()}));
        let audit = app.store.seed(Collection::Audits, json!({"area": area["id"], "scores": [], "status": 1, "created_by": me.to_string()}));
        let uri = format!("/audit/{}", audit["id"].as_str().unwrap());

        let (_, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"area": foreign["id"]}))).await;
        assert_eq!(body["message"], json!("audit.area.not.found"));
        let (_, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"area": "  "}))).await;
        assert_eq!(body["message"], json!("audit.area.required"));

        let (status, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"status": 0}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("audit.update.success"));
        assert_eq!(body["data"]["status"], json!(0));
        assert_eq!(body["data"]["area"], area["id"]);
    }

    #[tokio::test]
    async fn admins_create_and_edit_accounts() {
        let app = TestApp::new();
        let (_, admin) = app.user(Role::Admin);
        let (_, user) = app.user(Role::User);

        let (status, _) = app.call(Method::POST, "/user/add", Some(&user), Some(json!({"email": "x@y.io", "role": 2}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, body) = app.call(Method::POST, "/user/add", Some(&admin), Some(json!({"email": "nope", "role": 2}))).await;
        assert_eq!(body["message"], json!("user.email.invalid"));
        let (_, body) = app.call(Method::POST, "/user/add", Some(&admin), Some(json!({"email": "a@b.io"}))).await;
        assert_eq!(body["message"], json!("user.role.required"));

        let (status, body) =
            app.call(Method::POST, "/user/add", Some(&admin), Some(json!({"email": " Ana@Shop.io ", "role": 2}))).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["email"], json!("ana@shop.io"));
        assert_eq!(body["data"]["username"], json!("ana"));
        assert_eq!(body["data"]["verified"], json!(false));
        let ana = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = app.call(Method::POST, "/user/add/admin", Some(&admin), Some(json!({"email": "ana@shop.io"}))).await;
        assert_eq!(body["message"], json!("user.email.exist"));
        let (_, body) = app.call(Method::POST, "/user/add/admin", Some(&admin), Some(json!({"email": "ana@hq.io"}))).await;
        assert_eq!(body["data"]["role"], json!(1));
        assert_eq!(body["data"]["verified"], json!(true));
        assert_ne!(body["data"]["username"], json!("ana"));

        let uri = format!("/user/{}", ana);
        let (_, body) = app.call(Method::PUT, &uri, Some(&admin), Some(json!({"verified": true, "first_name": "Ana"}))).await;
        assert_eq!(body["data"]["verified"], json!(true));
        let (_, body) = app.call(Method::PUT, &uri, Some(&admin), Some(json!({"email": "ana@new.io"}))).await;
        assert_eq!(body["data"]["email"], json!("ana@new.io"));
        assert_eq!(body["data"]["verified"], json!(false));
        let (status, _) = app.call(Method::PUT, &uri, Some(&user), Some(json!({"first_name": "X"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app.get(&uri, &admin).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn members_manage_their_own_account() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let (other, other_token) = app.user(Role::User);
        app.store.seed(Collection::Areas, json!({"title": "Mine", "status": 1, "created_by": me.to_string()}));
        app.store.seed(Collection::Areas, json!({"title": "Theirs", "status": 1, "created_by": other.to_string()}));

        let (status, body) =
            app.call(Method::PUT, "/user/profile/update", Some(&token), Some(json!({"last_name": "Ng", "role": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["last_name"], json!("Ng"));
        assert_eq!(body["data"]["role"], json!(2));
        let (_, body) = app.call(Method::PUT, "/user/profile/update", Some(&token), Some(json!({"email": "me@new.io"}))).await;
        assert_eq!(body["data"]["verified"], json!(false));

        let (status, _) = app.get(&format!("/user/download/{}", other), &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = app.get(&format!("/user/download/{}", me), &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["areas"][0]["title"], json!("Mine"));
        assert_eq!(body["data"]["audits"], json!([]));

        let (status, _) = app.call(Method::DELETE, &format!("/user/{}", other), Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = app.call(Method::DELETE, &format!("/user/{}", me), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("user.delete.success"));
        let areas = app.store.all(Collection::Areas);
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0]["title"], json!("Theirs"));

        let (_, body) = app.get("/user/profile/me", &other_token).await;
        assert_eq!(body["data"]["id"], json!(other.to_string()));
    }

    #[tokio::test]
    async fn blank_update_leaves_the_record_alone() {
        let app = TestApp::new();
        let (me, token) = app.user(Role::User);
        let area = app.store.seed(Collection::Areas, json!({"title": "Dock", "status": 1, "created_by": me.to_string()}));
        let uri = format!("/area/{}", area["id"].as_str().unwrap());

        let (status, body) = app.call(Method::PUT, &uri, Some(&token), Some(json!({"title": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("area.title.required"));
        assert_eq!(app.store.all(Collection::Areas)[0]["title"], json!("Dock"));
    }

    #[tokio::test]
    async fn audit_add_reports_storage_failure_instead_of_missing_area() {
        let app = TestApp::new();
        let (_, token) = app.user(Role::User);
        app.store.take_offline(Collection::Areas);

        let audit = json!({"area": uuid::Uuid::new_v4().to_string(), "scores": [{"question": uuid::Uuid::new_v4().to_string(), "score": 1}]});
        let (status, body) = app.call(Method::POST, "/audit/add", Some(&token), Some(audit)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_ne!(body["message"], json!("audit.area.not.found"));
        assert!(app.store.all(Collection::Scores).is_empty());
    }
}
